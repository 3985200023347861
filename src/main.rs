use std::path::PathBuf;

fn main() {
    if handle_cli_flags() {
        return;
    }

    if let Err(err) = chirp::run() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}

fn handle_cli_flags() -> bool {
    let mut saw_flag = false;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("Chirp {}", chirp::VERSION);
                saw_flag = true;
            }
            "--help" | "-h" => {
                println!(
                    "Chirp - a micro-blogging feed in the terminal.\n\n  --version, -V          Show version and exit\n  --help,    -h          Show this help message\n  --export-html <path>   Write the stored feed as an HTML page and exit\n  --reset                Forget the stored feed and exit"
                );
                saw_flag = true;
            }
            "--export-html" => {
                saw_flag = true;
                let Some(path) = args.next() else {
                    eprintln!("--export-html needs a file path");
                    std::process::exit(2);
                };
                if let Err(err) = chirp::app::export_html(&PathBuf::from(&path)) {
                    eprintln!("Export failed: {err:?}");
                    std::process::exit(1);
                }
                println!("Wrote {path}");
            }
            "--reset" => {
                saw_flag = true;
                match chirp::app::reset() {
                    Ok(true) => println!("Stored feed removed."),
                    Ok(false) => println!("No stored feed to remove."),
                    Err(err) => {
                        eprintln!("Reset failed: {err:?}");
                        std::process::exit(1);
                    }
                }
            }
            _ => {}
        }
    }
    saw_flag
}
