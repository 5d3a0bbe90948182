//! Serializes the selected files into the XML export envelope.

use std::path::PathBuf;

use super::fs::FileSystem;

/// Escapes the characters that are not allowed inside an XML attribute.
pub fn escape_xml(unsafe_text: &str) -> String {
    let mut escaped = String::with_capacity(unsafe_text.len());
    for c in unsafe_text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Builds the `<project>` document for `paths`.
///
/// Paths that are no longer regular files, or whose text cannot be read,
/// are logged and left out.
pub async fn generate_xml_content(fs: &dyn FileSystem, paths: &[PathBuf]) -> String {
    tracing::info!("Generating XML for {} paths", paths.len());
    let mut file_blocks = Vec::with_capacity(paths.len());

    for path in paths {
        match fs.stat_path(path).await {
            Ok(stat) if stat.is_file => {}
            Ok(_) => {
                tracing::debug!("Skipping non-file in export: {}", path.display());
                continue;
            }
            Err(e) => {
                tracing::error!("Error processing file {}: {}", path.display(), e);
                continue;
            }
        }

        match fs.read_file_text(path).await {
            Ok(content) => file_blocks.push(format!(
                "\n    <file path=\"{}\">\n      <content><![CDATA[\n{}\n      ]]></content>\n    </file>",
                escape_xml(&path.to_string_lossy()),
                content
            )),
            Err(e) => {
                tracing::error!("Error processing file {}: {}", path.display(), e);
            }
        }
    }

    format!("<project>\n  {}\n</project>", file_blocks.join("\n"))
}
