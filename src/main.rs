//! Pages Deploy Agent - 生成代码的执行与 GitHub Pages 发布代理
//!
//! Usage:
//! - Normal mode: `pages-deploy-agent`
//! - With custom port: `pages-deploy-agent --port 8080`
//! - With a working tree: `pages-deploy-agent --repo-dir /srv/site`

use std::path::PathBuf;

use pages_deploy_agent::RuntimeConfig;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "pages_deploy_agent=info,tower_http=info";

/// 解析命令行参数
fn parse_args() -> RuntimeConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = RuntimeConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                config.port_override = args[i + 1].parse().ok();
                if config.port_override.is_none() {
                    eprintln!("Ignoring invalid --port value: {}", args[i + 1]);
                }
                i += 2;
            }
            "--repo-dir" if i + 1 < args.len() => {
                config.repo_dir_override = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    config
}

fn print_help() {
    println!("Pages Deploy Agent - 生成代码的执行与 GitHub Pages 发布代理");
    println!();
    println!("USAGE:");
    println!("    pages-deploy-agent [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --port <PORT>       Override the listening port (env: PORT)");
    println!("    --repo-dir <DIR>    Override the git working tree (env: REPO_DIR)");
    println!("    -h, --help          Print help information");
    println!();
    println!("EXAMPLES:");
    println!("    pages-deploy-agent                          # Normal mode");
    println!("    pages-deploy-agent --port 8080              # Custom port");
    println!("    pages-deploy-agent --repo-dir /srv/site     # Custom working tree");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() {
    let config = parse_args();
    init_tracing();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let result = rt.block_on(pages_deploy_agent::init_and_run_agent_with_config(config));

    if let Err(e) = result {
        tracing::error!(error = %e, "Agent exited with error");
        std::process::exit(1);
    }
}
