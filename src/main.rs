//! Sable - a modal terminal text editor
//! Main entry point

use sable::editor::{Editor, Options};
use sable::screen::CrosstermBackend;

fn main() {
    let options = Options::parse(std::env::args().skip(1));
    if options.show_help {
        println!("{}", Options::usage());
        return;
    }

    // Create terminal backend
    let backend = match CrosstermBackend::new() {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Failed to create terminal backend: {}", e);
            std::process::exit(1);
        }
    };

    // Create editor
    let mut editor = match Editor::new(backend, options) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Failed to initialize editor: {}", e);
            std::process::exit(1);
        }
    };

    // Run editor
    if let Err(e) = editor.run() {
        eprintln!("Editor error: {}", e);
        std::process::exit(1);
    }
}
