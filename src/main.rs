use anyhow::Result;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() == 1 {
        print_usage();
        std::process::exit(1);
    }
    if maybe_print_version(&args) {
        return Ok(());
    }
    if maybe_print_help(&args) {
        return Ok(());
    }
    gridtune::cli::run()
}

fn maybe_print_version(args: &[String]) -> bool {
    if args.len() == 2 && matches!(args[1].as_str(), "--version" | "-V") {
        println!("gridtune {}", env!("CARGO_PKG_VERSION"));
        println!("{}", gridtune::versioning::language_line());
        return true;
    }
    false
}

fn maybe_print_help(args: &[String]) -> bool {
    if args.len() == 2 && matches!(args[1].as_str(), "help" | "--help" | "-h") {
        print_usage();
        return true;
    }
    false
}

fn print_usage() {
    println!("Usage:");
    println!("  gridtune <script.tune> name=value[,name=value...]");
    println!("  gridtune <script.tune> --param-file <params.txt>");
    println!("  gridtune <script.tune> --range <ranges.txt>");
    println!("  gridtune --query \"<condition>\"");
    println!();
    println!("Options:");
    println!("  --results <path>     results file (default: results.csv)");
    println!("  --allow <names>      extra call names eligible for rewriting");
    println!("  --show-rewritten     print each rewritten variant before running");
    println!("  -h, --help           show this help");
    println!("  -V, --version        show version");
    println!();
    println!("Range file lines: name=[v1,v2,...] or name=start,end (inclusive).");
}
