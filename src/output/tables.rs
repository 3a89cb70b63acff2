use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn header_cells(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

/// Colours a run result: green for success, yellow for partial or cancelled, red for failure.
pub fn result_cell(status: Option<&str>, result: Option<&str>) -> Cell {
    match (status, result) {
        (_, Some(result)) => {
            let color = match result {
                "succeeded" => TableColor::Green,
                "partiallySucceeded" | "canceled" => TableColor::Yellow,
                "failed" => TableColor::Red,
                _ => TableColor::Reset,
            };
            Cell::new(result).fg(color)
        }
        (Some(status), None) => Cell::new(status).fg(TableColor::Blue),
        (None, None) => Cell::new("never run").fg(TableColor::DarkGrey),
    }
}

pub fn duration_cell(seconds: Option<i64>) -> Cell {
    let Some(seconds) = seconds else {
        return Cell::new("-").fg(TableColor::DarkGrey);
    };
    let text = if seconds >= 60 {
        format!("{}m {:02}s", seconds / 60, seconds % 60)
    } else {
        format!("{seconds}s")
    };
    Cell::new(text)
}

/// `resolved/total`, red when any declared group is missing from the library.
pub fn groups_cell(resolved: usize, total: usize) -> Cell {
    if total == 0 {
        return Cell::new("-").fg(TableColor::DarkGrey);
    }
    let text = format!("{resolved}/{total}");
    if resolved == total {
        Cell::new(text).fg(TableColor::Green)
    } else {
        Cell::new(text).fg(TableColor::Red)
    }
}
