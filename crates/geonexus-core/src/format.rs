use serde::Serialize;

/// One display block produced from an answer's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Block {
    /// `level` 1 is the most prominent heading (`### `), 3 the least (`# `)
    Heading { level: u8, text: String },
    List { items: Vec<String> },
    Paragraph { text: String },
}

/// Heading prefixes, checked longest first so `### ` never matches as `# `.
const HEADINGS: [(&str, u8); 3] = [("### ", 1), ("## ", 2), ("# ", 3)];

/// Turn delimited answer text into heading, list, and paragraph blocks.
///
/// Each line is trimmed before classification. Consecutive `* ` / `- ` lines
/// collapse into a single list block; blank lines emit nothing and do not
/// interrupt a list.
pub fn format_answer(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    for line in text.split('\n') {
        let line = line.trim();

        if let Some((rest, level)) = HEADINGS
            .iter()
            .find_map(|(prefix, level)| line.strip_prefix(*prefix).map(|rest| (rest, *level)))
        {
            flush_list(&mut pending, &mut blocks);
            blocks.push(Block::Heading {
                level,
                text: rest.to_string(),
            });
        } else if let Some(item) = line.strip_prefix("* ").or_else(|| line.strip_prefix("- ")) {
            pending.push(item.to_string());
        } else if !line.is_empty() {
            flush_list(&mut pending, &mut blocks);
            blocks.push(Block::Paragraph {
                text: line.to_string(),
            });
        }
    }

    flush_list(&mut pending, &mut blocks);
    blocks
}

fn flush_list(pending: &mut Vec<String>, blocks: &mut Vec<Block>) {
    if !pending.is_empty() {
        blocks.push(Block::List {
            items: std::mem::take(pending),
        });
    }
}
