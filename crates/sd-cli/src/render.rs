//! Text rendering of formations, responses and errors.

use colored::Colorize;
use sd_core::{
    CallError, Dancer, Formation, Gender, Position, Resolve, Response, SequenceEntry, TableError,
};

fn label(d: &Dancer) -> String {
    let text = d.label();
    match d.id().map(|id| id.gender) {
        Some(Gender::Boy) => text.blue().to_string(),
        Some(Gender::Girl) => text.magenta().to_string(),
        None => text.dimmed().to_string(),
    }
}

/// Formation name and a grid of dancer labels, boys and girls colored.
pub fn diagram(formation: &Formation) -> String {
    let mut xs: Vec<i32> = formation.dancers().iter().map(|d| d.position.x).collect();
    xs.sort_unstable();
    xs.dedup();
    let mut ys: Vec<i32> = formation.dancers().iter().map(|d| d.position.y).collect();
    ys.sort_unstable_by(|a, b| b.cmp(a));
    ys.dedup();

    let mut out = format!(
        "{} {}\n",
        formation.name().bold(),
        format!("({})", formation.kind()).dimmed()
    );
    for y in ys {
        let mut line = String::from("    ");
        for &x in &xs {
            match formation.at(Position::new(x, y)) {
                Some(d) => line.push_str(&label(d)),
                None => line.push_str("   "),
            }
            line.push_str("  ");
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

pub fn resolve_line(resolve: &Resolve) -> String {
    format!("{} {}", "resolve is:".green().bold(), resolve)
}

/// One committed call, numbered.
pub fn entry(number: usize, entry: &SequenceEntry) -> String {
    let mut out = format!("{} {}\n", format!("{}:", number).cyan().bold(), entry.interpretation);
    out.push_str(&diagram(&entry.formation));
    if let Some(ref r) = entry.resolve {
        out.push_str(&resolve_line(r));
        out.push('\n');
    }
    out
}

/// Renders what a line of input did. `length` is the sequence length after it.
pub fn response(response: &Response, length: usize) -> String {
    match response {
        Response::Started { start, formation } => {
            format!("{}\n{}", start.to_string().cyan().bold(), diagram(formation))
        }
        Response::Called(e) => entry(length, e),
        Response::Undone {
            formation,
            remaining,
        } => format!(
            "{} ({} left)\n{}",
            "undone".yellow().bold(),
            remaining,
            diagram(formation)
        ),
        Response::ConfirmAbort => {
            format!("{}\n", "Do you really want to abort this sequence? (y/n)".yellow())
        }
        Response::Aborted => format!("{}\n", "sequence aborted".yellow().bold()),
        Response::ResolveStatus(Some(r)) => format!("{}\n", resolve_line(r)),
        Response::ResolveStatus(None) => format!("{}\n", "no resolve".dimmed()),
        Response::Getout {
            getout,
            number,
            found,
        } => format!(
            "{} {}\n{}\n{}",
            format!("getout {} of {}:", number, found).cyan().bold(),
            getout.calls.join("; "),
            resolve_line(&getout.resolve),
            "type \"accept\" to keep it or \"find another\"\n".dimmed()
        ),
        Response::Accepted(entries) => {
            let first = (length + 1).saturating_sub(entries.len()).max(1);
            entries
                .iter()
                .enumerate()
                .map(|(i, e)| entry(first + i, e))
                .collect()
        }
        Response::Commented(text) => format!("   {}\n", format!("{{ {} }}", text).dimmed()),
        Response::Written(transcript) => transcript.to_string(),
        Response::Nothing => String::new(),
    }
}

pub fn call_error(err: &CallError) -> String {
    format!("{} {}", format!("[{}]", err.code()).red().bold(), err)
}

pub fn table_error(err: &TableError) -> String {
    format!("{} {}", format!("[{}]", err.code()).red().bold(), err)
}

pub fn help() -> String {
    let rows = [
        ("heads start | sides start", "start a sequence"),
        ("just as they are", "start from the squared set"),
        ("two couples only", "start with couples 1 and 3"),
        ("undo last call", "take back the last call"),
        ("abort this sequence", "discard the sequence (asks for y)"),
        ("resolve", "show the resolve or search for one"),
        ("find another", "show the next getout found"),
        ("accept", "add the getout shown to the sequence"),
        ("comment <text>", "note a comment after the last call"),
        ("write this sequence", "print the sequence so far"),
        ("quit", "leave"),
    ];
    let mut out = String::new();
    for (command, what) in rows {
        out.push_str(&format!("  {:<28} {}\n", command.cyan(), what.dimmed()));
    }
    out.push_str("  anything else is read as a call\n");
    out
}
