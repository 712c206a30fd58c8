// src/format.rs
//
// Post-processing for provider answers that list locations as marker-glyph
// blocks. Tolerant by design: malformed blocks are dropped whole, and input
// with no block markers at all is passed through verbatim.

/// Leading marker of one location block.
const BLOCK_MARKER: char = '\u{1F3E2}'; // 🏢
/// Marker preceding the address part of a block.
const ADDRESS_MARKER: char = '\u{1F4CD}'; // 📍
/// Marker preceding the hours part of a block.
const HOURS_MARKER: char = '\u{23F0}'; // ⏰

/// Render every well-formed `🏢 name 📍 address ⏰ hours` block as three
/// lines, blocks separated by a blank line. Blocks missing the address or
/// hours marker are omitted entirely. Text without any block marker is
/// returned unchanged.
pub fn format_location_blocks(raw: &str) -> String {
    if !raw.contains(BLOCK_MARKER) {
        return raw.to_string();
    }

    let mut rendered = Vec::new();
    for segment in raw.split(BLOCK_MARKER) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        if let Some(block) = render_block(segment) {
            rendered.push(block);
        }
    }

    rendered.join("\n\n")
}

fn render_block(segment: &str) -> Option<String> {
    let (name, rest) = segment.split_once(ADDRESS_MARKER)?;
    let (address, hours) = rest.split_once(HOURS_MARKER)?;

    let name = name.trim();
    let address = address.replace("Address:", "");
    let hours = hours.replace("Hours:", "");

    Some(format!(
        "{BLOCK_MARKER} {name}\n{ADDRESS_MARKER} Address: {}\n{HOURS_MARKER} Hours: {}",
        address.trim(),
        hours.trim()
    ))
}
