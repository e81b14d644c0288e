use anyhow::{Context, Result, bail};
use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;

use hunkscope::cli::{
    self, Commands, FileArgs, PatchArgs, RegionArgs, RiskArgs, StagedArgs, SummaryArgs,
};
use hunkscope::config::Config;
use hunkscope::gutter::{change_region, classify};
use hunkscope::parser::parse_diff_with;
use hunkscope::risk::scan_hunk_with;
use hunkscope::staged::staged_hunks_by_file;
use hunkscope::stat::{DiffSummary, parse_name_status, parse_numstat};
use hunkscope::synthetic::new_file_diff_text;
use hunkscope::{DiffLine, FileDiff, LineKind};

fn main() -> Result<()> {
    env_logger::init();
    let args = cli::parse_args();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::discover(Path::new("."))?,
    };

    match args.command {
        Commands::Summary(summary_args) => handle_summary(&summary_args, &config)?,
        Commands::Show(input) => {
            let files = load_diff(&input.diff, &config)?;
            print!("{}", render_show(&files));
        }
        Commands::Patch(patch_args) => handle_patch(&patch_args, &config)?,
        Commands::Staged(staged_args) => handle_staged(&staged_args, &config)?,
        Commands::Gutter(file_args) => handle_gutter(&file_args, &config)?,
        Commands::Region(region_args) => handle_region(&region_args, &config)?,
        Commands::Risk(risk_args) => handle_risk(&risk_args, &config)?,
        Commands::NewFile(new_file_args) => {
            let content = std::fs::read_to_string(&new_file_args.path)
                .with_context(|| format!("Failed to read {}", new_file_args.path.display()))?;
            let path = new_file_args.path.to_string_lossy().replace('\\', "/");
            match new_file_diff_text(&path, &content) {
                Some(text) => print!("{text}"),
                None => println!("No changes (empty file)"),
            }
        }
    }

    Ok(())
}

/// Read a file, or stdin for "-".
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read diff from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_diff(path: &Path, config: &Config) -> Result<Vec<FileDiff>> {
    let text = read_input(path)?;
    Ok(parse_diff_with(&text, &config.highlight))
}

fn find_file<'a>(files: &'a [FileDiff], name: &str) -> Result<&'a FileDiff> {
    match files.iter().find(|f| f.id == name || f.old_path == name) {
        Some(file) => Ok(file),
        None => bail!("No changes for {} in diff", name),
    }
}

fn handle_summary(args: &SummaryArgs, config: &Config) -> Result<()> {
    let files = load_diff(&args.input.diff, config)?;
    let numstat = match &args.numstat {
        Some(path) => parse_numstat(&read_input(path)?),
        None => Vec::new(),
    };
    let statuses = match &args.name_status {
        Some(path) => parse_name_status(&read_input(path)?),
        None => Vec::new(),
    };

    let summary = DiffSummary::from_parts(&files, &numstat, &statuses);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.files.is_empty() {
        println!("No changes detected");
        return Ok(());
    }

    for file in &summary.files {
        let badge = file.status.map_or(' ', |s| s.as_char());
        if file.binary {
            println!("{} {:40} binary", badge, file.path);
        } else {
            println!(
                "{} {:40} {:>3} hunks  +{} -{}",
                badge, file.path, file.hunks, file.additions, file.deletions
            );
        }
    }
    println!("─────────────────────────────────────");
    println!(
        "{} files, +{} -{}",
        summary.files.len(),
        summary.total_additions,
        summary.total_deletions
    );

    Ok(())
}

/// Render lines with `[-…-]` / `{+…+}` around highlighted ranges.
fn render_show(files: &[FileDiff]) -> String {
    let mut out = String::new();
    for file in files {
        let _ = writeln!(
            out,
            "=== {} (+{} -{})",
            file.id,
            file.addition_count(),
            file.deletion_count()
        );
        for hunk in &file.hunks {
            let _ = writeln!(out, "--- hunk {}", hunk.id);
            for line in &hunk.lines {
                let _ = writeln!(out, "{}", render_line(line));
            }
        }
    }
    out
}

fn render_line(line: &DiffLine) -> String {
    if line.kind == LineKind::HunkHeader {
        return line.text.clone();
    }

    let (open, close) = match line.kind {
        LineKind::Deletion => ("[-", "-]"),
        _ => ("{+", "+}"),
    };

    let mut out = String::new();
    out.push(line.kind.marker());
    let mut cursor = 0;
    for range in line.inline_highlights.iter().flatten() {
        out.push_str(&line.text[cursor..range.start]);
        out.push_str(open);
        out.push_str(&line.text[range.clone()]);
        out.push_str(close);
        cursor = range.end;
    }
    out.push_str(&line.text[cursor..]);
    out
}

fn handle_patch(args: &PatchArgs, config: &Config) -> Result<()> {
    let files = load_diff(&args.target.input.diff, config)?;
    let file = find_file(&files, &args.target.file)?;

    let hunk_id = match args.hunk.parse::<usize>() {
        Ok(idx) if args.hunk.len() < 16 => match file.hunks.get(idx) {
            Some(hunk) => hunk.id.clone(),
            None => bail!("{} has {} hunks, no index {}", file.id, file.hunks.len(), idx),
        },
        _ => args.hunk.clone(),
    };

    let patch = file.patch_for(&hunk_id)?;
    print!("{patch}");
    Ok(())
}

fn handle_staged(args: &StagedArgs, config: &Config) -> Result<()> {
    let worktree = load_diff(&args.worktree, config)?;
    let staged = load_diff(&args.index, config)?;

    let result = staged_hunks_by_file(&worktree, &staged);
    if result.is_empty() {
        println!("No staged hunks");
        return Ok(());
    }

    for (file_id, ids) in result {
        let file = find_file(&worktree, file_id)?;
        // Keep diff order rather than set order
        for hunk in file.hunks.iter().filter(|h| ids.contains(&h.id)) {
            println!("{}\t{}\t{}", file_id, hunk.id, hunk.header);
        }
    }
    Ok(())
}

fn handle_gutter(args: &FileArgs, config: &Config) -> Result<()> {
    let files = load_diff(&args.input.diff, config)?;
    let file = find_file(&files, &args.file)?;

    for (line, change) in classify(file) {
        println!("{:>6} {}", line, change.symbol());
    }
    Ok(())
}

fn handle_region(args: &RegionArgs, config: &Config) -> Result<()> {
    let files = load_diff(&args.target.input.diff, config)?;
    let file = find_file(&files, &args.target.file)?;

    let Some(region) = change_region(file, args.line) else {
        println!("Line {} is unchanged", args.line);
        return Ok(());
    };

    println!(
        "Lines {}-{}",
        region.new_lines.start(),
        region.new_lines.end()
    );
    for text in &region.deleted {
        println!("-{text}");
    }
    for text in &region.added {
        println!("+{text}");
    }
    Ok(())
}

fn handle_risk(args: &RiskArgs, config: &Config) -> Result<()> {
    let files = load_diff(&args.input.diff, config)?;

    let mut rows = Vec::new();
    for file in &files {
        for hunk in &file.hunks {
            for flag in scan_hunk_with(hunk, &config.risk) {
                rows.push((file.id.as_str(), hunk.id.as_str(), flag));
            }
        }
    }

    if args.json {
        let json: Vec<serde_json::Value> = rows
            .iter()
            .map(|(file, hunk, flag)| {
                serde_json::json!({ "file": file, "hunk": hunk, "flag": flag })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("✓ No risk flags");
        return Ok(());
    }

    for (file, _, flag) in &rows {
        let line = flag.line_number.map_or("?".to_string(), |n| n.to_string());
        println!("⚠ {}:{} {}", file, line, flag.description);
    }
    Ok(())
}
