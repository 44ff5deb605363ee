/// Splits a line at tabs and runs of two or more whitespace characters.
///
/// Each cell comes with the char offset it starts at in `line`. Single spaces
/// stay inside a cell.
pub(crate) fn split_cells_with_offsets(line: &str) -> Vec<(usize, String)> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    let mut pending_space = false;

    for (index, ch) in line.chars().enumerate() {
        if ch == '\t' || (pending_space && ch.is_whitespace()) {
            if !current.is_empty() {
                cells.push((start, std::mem::take(&mut current)));
            }
            pending_space = false;
            continue;
        }

        if ch.is_whitespace() {
            pending_space = !current.is_empty();
            continue;
        }

        if current.is_empty() {
            start = index;
        } else if pending_space {
            current.push(' ');
        }
        pending_space = false;
        current.push(ch);
    }

    if !current.is_empty() {
        cells.push((start, current));
    }

    cells
}

pub(crate) fn split_line_into_cells(line: &str) -> Vec<String> {
    split_cells_with_offsets(line)
        .into_iter()
        .map(|(_, cell)| cell)
        .collect()
}

pub(crate) fn soft_split_line_into_cells(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}
