// Output formatting helpers for CLI commands
// ANSI status lines written to stderr

const BOLD: &str = "1";
const DIM: &str = "2";
const RED: &str = "31";
const GREEN: &str = "32";
const YELLOW: &str = "33";
const CYAN: &str = "36";
const BOLD_RED: &str = "1;31";
const BOLD_GREEN: &str = "1;32";
const BOLD_BLUE: &str = "1;34";
const BOLD_CYAN: &str = "1;36";

fn paint(style: &str, text: &str) -> String {
    format!("\x1b[{}m{}\x1b[0m", style, text)
}

/// Right-aligned action word followed by a message
pub fn status(action: &str, message: &str) {
    eprintln!("{} {}", paint(BOLD_CYAN, &format!("{:>12}", action)), message);
}

pub fn success(message: &str) {
    eprintln!("{} {}", paint(BOLD_GREEN, "  \u{2713}"), message);
}

pub fn failure(message: &str) {
    eprintln!("{} {}", paint(BOLD_RED, "  \u{2717}"), message);
}

/// A passed check in a list of checks
pub fn check(message: &str) {
    eprintln!("{} {}", paint(GREEN, "  \u{2713}"), message);
}

pub fn warning(message: &str) {
    eprintln!("{} {}", paint(YELLOW, "  !"), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", paint(BOLD_RED, "error:"), message);
}

pub fn info(message: &str) {
    eprintln!("{} {}", paint(CYAN, "  i"), message);
}

pub fn dim(message: &str) {
    eprintln!("{}", paint(DIM, message));
}

pub fn dim_success(message: &str) {
    eprintln!("{}", paint(GREEN, message));
}

pub fn dim_failure(message: &str) {
    eprintln!("{}", paint(RED, message));
}

/// Section header: "==> message"
pub fn header(message: &str) {
    eprintln!("{}", paint(BOLD, &format!("==> {}", message)));
}

/// Node header: "  [kind] label (id)"
pub fn node_header(node_id: &str, label: &str, kind: &str) {
    let tag = paint(BOLD_BLUE, &format!("  [{}]", kind));
    if label == node_id {
        eprintln!("{} {}", tag, node_id);
    } else {
        eprintln!("{} {} ({})", tag, label, node_id);
    }
}

/// Node result on one indented line, cut at a fixed width
pub fn node_result(rendered: &str) {
    const MAX_WIDTH: usize = 96;
    if rendered.chars().count() > MAX_WIDTH {
        let head: String = rendered.chars().take(MAX_WIDTH).collect();
        eprintln!("        | {}...", head);
    } else {
        eprintln!("        | {}", rendered);
    }
}
