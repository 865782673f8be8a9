use std::path::PathBuf;

#[derive(Debug)]
struct CliArgs {
    headless: bool,
    packaged: bool,
    config_dir: Option<PathBuf>,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            headless: false,
            packaged: !cfg!(debug_assertions),
            config_dir: None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;
    tunedock::app::run_with_startup(tunedock::app::AppStartupOptions {
        headless: args.headless,
        packaged: args.packaged,
        config_dir: args.config_dir,
    })
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--headless" => out.headless = true,
            "--packaged" => out.packaged = true,
            "--dev" => out.packaged = false,
            "--config-dir" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--config-dir requires a directory");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--config-dir cannot be empty");
                }
                out.config_dir = Some(PathBuf::from(value.trim()));
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("tunedock");
    println!("  --headless          Keep menus in memory, no status-area icon");
    println!("  --packaged          Load the tray icon from bundled resources");
    println!("  --dev               Load the tray icon from ./static");
    println!("  --config-dir dir    Preferences and logs directory");
    println!();
    println!("Reads player events as JSON lines on stdin, writes commands to stdout.");
}
