// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_script(frames: usize) -> String {
    let base = "#Start\n  10,R,J\n   5,L\n  20,D,X\n\n";
    base.repeat(frames)
}

/// One anchor over the frame count of every input line
#[allow(dead_code)]
pub fn anchor_every_input(doc: &mut linedoc_engine::Document) {
    let rows: Vec<usize> = (0..doc.line_count())
        .filter(|row| doc.line(*row).starts_with("  "))
        .collect();
    for row in rows {
        doc.add_anchor(linedoc_engine::Anchor::new(row, 2, 4));
    }
}
