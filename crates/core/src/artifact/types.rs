//! Types shared by the artifact encoder, renderer and generator.

use std::path::PathBuf;

use crate::identifiers::TransactionCode;

/// Display and placement data for one ticket.
#[derive(Debug, Clone)]
pub struct TicketMetadata {
    pub transaction_code: TransactionCode,
    /// 1-based position of the ticket within its transaction.
    pub index: u32,
    pub event_id: String,
    pub event_name: String,
    pub buyer_email: String,
    pub user_name: String,
    pub venue: String,
    pub date: String,
}

impl TicketMetadata {
    /// Attachment filename, e.g. `EVT1_ticket_2.pdf`.
    pub fn file_name(&self) -> String {
        format!("{}_ticket_{}.pdf", sanitize_component(&self.event_id), self.index)
    }

    /// Location of this ticket's artifact under `output_dir`.
    ///
    /// Each transaction gets its own folder, so concurrent purchases for
    /// the same event never write to the same file.
    pub fn artifact_path(&self, output_dir: &std::path::Path) -> PathBuf {
        output_dir
            .join(self.transaction_code.as_str())
            .join(self.file_name())
    }
}

/// Keep event ids from escaping the output directory.
fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect::<String>()
        .replace("..", "_")
}

/// A square matrix of QR modules, row-major, `true` = dark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    width: usize,
    modules: Vec<bool>,
}

impl Symbol {
    /// Builds a symbol from row-major modules. Returns `None` if the
    /// module count is not `width * width`.
    pub fn new(width: usize, modules: Vec<bool>) -> Option<Self> {
        (width > 0 && modules.len() == width * width).then_some(Self { width, modules })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.modules[y * self.width + x]
    }

    /// Number of dark modules.
    pub fn dark_count(&self) -> usize {
        self.modules.iter().filter(|m| **m).count()
    }
}
