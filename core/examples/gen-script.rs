//! Generates input script JSON files for the headless host.
//!
//! Usage:
//!   cargo run -p teamtilt-core --example gen-script -- [idle|walk|hop] [world] [level] > script.json

use teamtilt_core::*;

fn main() {
    let mut args = std::env::args().skip(1);
    let mode = args.next().unwrap_or_else(|| "idle".to_string());
    let world = args.next().and_then(|a| a.parse().ok()).unwrap_or(1);
    let level = args.next().and_then(|a| a.parse().ok()).unwrap_or(1);

    let ticks: Vec<u8> = match mode.as_str() {
        "idle" => {
            // Ten seconds standing still: land and stay
            vec![0; 600]
        }
        "walk" => {
            // Hold right the whole time
            vec![button::RIGHT; 600]
        }
        "hop" => {
            // Walk right, jumping once a second
            (0..600u32)
                .map(|t| {
                    if t % 60 == 0 {
                        button::RIGHT | button::JUMP
                    } else {
                        button::RIGHT
                    }
                })
                .collect()
        }
        _ => {
            eprintln!("Unknown mode: {}. Use 'idle', 'walk', or 'hop'", mode);
            std::process::exit(1);
        }
    };

    let script = InputScript {
        world,
        level,
        ticks,
    };

    // Verify by running the session
    let mut progress = MemoryProgress::new();
    match run_script(&script, default_config(), &mut progress) {
        Ok(summary) => {
            eprintln!("=== Replay result ({} mode) ===", mode);
            eprintln!("Level: {}", summary.level);
            eprintln!("Frames: {} (simulated {})", summary.frames, summary.ticks);
            eprintln!("Completed: {}", summary.completed);
            eprintln!("Respawns: {}", summary.respawns);
        }
        Err(err) => {
            eprintln!("Replay failed: {err}");
            std::process::exit(1);
        }
    }

    println!("{}", serde_json::to_string(&script).unwrap());
}
