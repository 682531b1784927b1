use quote_core::{AppViewModel, PhaseView};

/// Text shown for a view model: a phase header, the numbered quote list and
/// the status lines.
pub fn render(view: &AppViewModel) -> String {
    let mut out = String::new();
    let header = match view.phase {
        PhaseView::Idle => "Ready to generate",
        PhaseView::Loading => "Loading",
        PhaseView::Ready => "Quotes",
        PhaseView::Failed => "Failed",
    };
    out.push_str(&format!("== {header} ==\n"));

    for row in &view.quotes {
        let marker = if row.active { '>' } else { ' ' };
        out.push_str(&format!("{marker}{:>3}. {}\n", row.index + 1, row.text));
    }
    if let Some(status) = &view.status {
        out.push_str(status);
        out.push('\n');
    }
    if let Some(locate) = &view.locate_status {
        out.push_str(locate);
        out.push('\n');
    }
    out
}

pub fn print(view: &AppViewModel) {
    print!("{}", render(view));
}
