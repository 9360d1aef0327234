//! Export of the rendered summary as a standalone HTML document.

use std::path::{Path, PathBuf};

/// File name an export of `document_name` is written under.
///
/// Path separators in the document name are replaced so the export always
/// lands directly in the target directory.
pub fn export_file_name(document_name: &str) -> String {
    let safe: String = document_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("Summary of {safe}.html")
}

/// Wrap the rendered fragment in a complete HTML document.
pub fn render_document(document_name: &str, rendered: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Summary of {}</title>\n</head>\n<body>\n{rendered}\n</body>\n</html>\n",
        escape_text(document_name)
    )
}

/// Write the export into `dir`, creating it if needed. Overwrites an existing
/// export of the same document.
pub fn write_export(dir: &Path, document_name: &str, rendered: &str) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(document_name));
    std::fs::write(&path, render_document(document_name, rendered))?;
    Ok(path)
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}
