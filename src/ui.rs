use colored::Colorize;
use ipakit::AttributeMap;
use reconcile::{CommandKind, ExecutionPlan, Operation, ProgressCallback, ReconciliationResult};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

// ============================================================================
// Plan Display
// ============================================================================

fn symbol(kind: CommandKind) -> colored::ColoredString {
    match kind {
        CommandKind::Create => "+".green().bold(),
        CommandKind::Modify => "~".yellow().bold(),
        CommandKind::Delete => "-".red().bold(),
        CommandKind::AddMember => "+".green(),
        CommandKind::RemoveMember => "-".red(),
    }
}

fn verb(kind: CommandKind) -> &'static str {
    match kind {
        CommandKind::Create => "create",
        CommandKind::Modify => "modify",
        CommandKind::Delete => "delete",
        CommandKind::AddMember => "add members to",
        CommandKind::RemoveMember => "remove members from",
    }
}

/// Render arguments as `key=value` pairs
pub fn format_arguments(args: &AttributeMap) -> String {
    args.iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One line describing an operation
pub fn describe(operation: &Operation) -> String {
    let mut line = format!("{} {}", verb(operation.kind), operation.target.bold());
    if !operation.args.is_empty() {
        line.push_str(&format!(" {}", format_arguments(&operation.args).dimmed()));
    }
    line
}

/// Show the operations a plan contains
pub fn display_plan(plan: &ExecutionPlan) {
    if plan.is_empty() {
        return;
    }

    header("Planned changes");
    for operation in &plan.operations {
        println!("  {} {}", symbol(operation.kind), describe(operation));
    }
}

/// Print the closing line for a run
pub fn print_summary(result: &ReconciliationResult) {
    println!();
    if !result.changed {
        success("Groups are up to date");
        return;
    }

    let summary = &result.summary;
    let mut parts = Vec::new();
    for (count, label) in [
        (summary.created, "created"),
        (summary.modified, "modified"),
        (summary.deleted, "deleted"),
        (summary.member_additions, "member additions"),
        (summary.member_removals, "member removals"),
    ] {
        if count > 0 {
            parts.push(format!("{count} {label}"));
        }
    }

    if result.dry_run {
        info(&format!(
            "Dry run - would apply {} change(s): {}",
            summary.total_changes(),
            parts.join(", ")
        ));
    } else {
        success(&format!(
            "Applied {} change(s): {}",
            summary.total_changes(),
            parts.join(", ")
        ));
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Progress reporting on the terminal
pub struct TerminalProgress {
    /// Print nothing (used for --quiet and --json)
    pub silent: bool,
}

impl ProgressCallback for TerminalProgress {
    fn on_plan(&mut self, plan: &ExecutionPlan) {
        if !self.silent {
            display_plan(plan);
        }
    }

    fn on_batch_start(&mut self, count: usize) {
        if !self.silent {
            println!();
            println!("  {} Applying {} operation(s)...", "→".cyan(), count);
        }
    }

    fn on_operation_start(&mut self, _operation: &Operation) {}

    fn on_operation_complete(&mut self, operation: &Operation, summary: Option<&str>) {
        if self.silent {
            return;
        }
        match summary {
            Some(summary) => println!("  {} {}", "✓".green(), summary),
            None => println!(
                "  {} {} {}",
                "○".dimmed(),
                describe(operation),
                "(no change)".dimmed()
            ),
        }
    }

    fn on_operation_failed(&mut self, operation: &Operation, error: &str) {
        // errors are shown even when silent
        eprintln!("  {} {}: {}", "✗".red(), describe(operation), error);
    }

    fn on_batch_complete(&mut self) {}
}

// ============================================================================
// Tests
// ============================================================================
