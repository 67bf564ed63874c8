use std::env;
use std::time::Duration;

use inquire::{Select, Text};

use cpx400::psu::CpxPsu;
use cpx400::transport::TcpTransport;

// Configuration constants - adjust these for your setup
const DEFAULT_PORT: u16 = 9221;
// The supply dials a fresh TCP session per transaction; a generous
// per-operation deadline keeps slow LANs workable.
const DEADLINE_MS: u64 = 1000;
const SECTIONS: [u32; 2] = [1, 2];

fn main() {
    env_logger::init();

    // Get the device address from a command line arg or an interactive prompt
    let host = env::args().nth(1).unwrap_or_else(|| {
        Text::new("Device host:")
            .with_default("192.168.1.50")
            .prompt()
            .expect("Failed to read host")
    });

    let port: u16 = env::args()
        .nth(2)
        .map(|arg| arg.parse().expect("Invalid port"))
        .unwrap_or(DEFAULT_PORT);

    println!("Using device at {host}:{port}");

    let transport = TcpTransport::new(&host, port);
    let mut psu = CpxPsu::builder()
        .transport(transport)
        .deadline(Duration::from_millis(DEADLINE_MS))
        .build()
        .expect("Failed to build client");

    loop {
        let action = Select::new(
            "Action:",
            vec!["Show sections", "Toggle output", "Quit"],
        )
        .prompt()
        .expect("Failed to select action");

        match action {
            "Show sections" => {
                for section in SECTIONS {
                    match psu.section(section) {
                        Ok(data) => {
                            let state = if data.enabled { "ON" } else { "OFF" };
                            println!(
                                "Section {section}: [{state}] {} / {} V DC, {} / {} A",
                                data.actual_voltage,
                                data.set_voltage,
                                data.actual_current,
                                data.set_current,
                            );
                        }
                        Err(err) => println!("Section {section}: error: {err}"),
                    }
                }
            }
            "Toggle output" => {
                let section = Select::new("Section:", SECTIONS.to_vec())
                    .prompt()
                    .expect("Failed to select section");
                let current = psu
                    .get_output_state(section)
                    .expect("Failed to read output state");
                let confirmed = psu
                    .set_output_state(section, !current)
                    .expect("Failed to set output state");
                println!(
                    "Section {section} output is now {}",
                    if confirmed { "ON" } else { "OFF" }
                );
            }
            _ => break,
        }
    }
}
