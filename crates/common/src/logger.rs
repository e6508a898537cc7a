use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

const QUIET_TARGETS: &[&str] = &["hyper=warn", "reqwest=warn", "teloxide=warn"];

pub fn setup_logger() {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    for target in QUIET_TARGETS {
        if let Ok(directive) = target.parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        // .with_file(true)
        // .with_line_number(true)
        .with_target(true)
        .with_level(true)
        .with_ansi(true)
        .compact()
        .with_env_filter(filter)
        .init();
}
