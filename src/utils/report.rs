const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Lines of a framed summary panel with `title` set into the top border.
/// Widths are measured in chars so non-ASCII paths keep the frame aligned.
pub fn render_panel(title: &str, rows: &[String]) -> Vec<String> {
    let heading = format!(" {} ", title);
    let inner = rows
        .iter()
        .map(|row| row.chars().count() + 2)
        .chain(std::iter::once(heading.chars().count() + 2))
        .max()
        .unwrap_or(0);

    let mut panel = Vec::with_capacity(rows.len() + 2);
    panel.push(format!(
        "╭─{}{}╮",
        heading,
        "─".repeat(inner - heading.chars().count() - 1)
    ));
    for row in rows {
        let pad = inner - row.chars().count() - 1;
        panel.push(format!("│ {}{}│", row, " ".repeat(pad)));
    }
    panel.push(format!("╰{}╯", "─".repeat(inner)));
    panel
}

/// Prints a panel to stderr, framed in green.
pub fn print_panel(title: &str, rows: &[String]) {
    for line in render_panel(title, rows) {
        eprintln!("{}{}{}", GREEN, line, RESET);
    }
}
