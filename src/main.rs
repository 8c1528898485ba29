//! # Voxel World Entry Point
//!
//! Calls into the library's `run()` function. Reads `voxel_world.json` from
//! the working directory if present.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --release
//! ```

fn main() {
    if let Err(err) = voxel_world::run() {
        log::error!("{err}");
        eprintln!("voxel_world: {err}");
        std::process::exit(1);
    }
}
