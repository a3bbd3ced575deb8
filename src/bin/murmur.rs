use clap::{App, Arg, ArgMatches};
use failure::Error;
use log::*;
use murmur::{node, Config};

fn main() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "murmur=info,actix_web=info");
    }
    env_logger::init();
    if let Err(err) = start() {
        error!("Failure: {}", err);
        std::process::exit(1);
    }
}

fn start() -> Result<(), Error> {
    let matches = App::new("murmur")
        .version("0.1.0")
        .author("Kyle Phelps <kphelps@salsify.com>")
        .about("Gossip-based cluster membership")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("PATH")
                .default_value("./murmur")
                .help("path to configuration file"),
        )
        .arg(
            Arg::with_name("bind")
                .short("b")
                .long("bind")
                .value_name("HOST:PORT")
                .takes_value(true)
                .help("address to listen on, also this node's identity"),
        )
        .arg(
            Arg::with_name("peers")
                .short("p")
                .long("peers")
                .value_name("HOST:PORT,...")
                .takes_value(true)
                .help("comma separated seed peers"),
        )
        .get_matches();

    let settings = load_config(&matches)?;
    node::run(&settings)
}

fn load_config(matches: &ArgMatches) -> Result<Config, Error> {
    let config_path = matches.value_of("config").unwrap_or("./murmur");
    let mut builder = Config::layered_builder(config_path)?;
    if let Some(bind) = matches.value_of("bind") {
        builder = builder.set_override("bind", bind)?;
    }
    if let Some(peers) = matches.value_of("peers") {
        let peers: Vec<String> = peers
            .split(',')
            .map(str::trim)
            .filter(|peer| !peer.is_empty())
            .map(String::from)
            .collect();
        builder = builder.set_override("peers", peers)?;
    }
    Config::from_builder(builder)
}
