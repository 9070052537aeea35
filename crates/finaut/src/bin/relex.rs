//! Split standard input into tokens with a lexer built from the command line

#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    clippy::clone_on_ref_ptr,
    missing_debug_implementations,
    missing_copy_implementations
)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions)]

use std::io::{self, Read};

use finaut::{
    FiniteAutomaton, RegularExpression,
    lex::{LexerBuilder, Token},
    re::ParseError,
};
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("Rule {0:?} is not of the form IDENTIFIER=REGEX")]
    BadRule(String),
    #[error("Invalid expression for {identifier:?}")]
    Parse {
        identifier: String,
        #[source]
        source: ParseError,
    },
    #[error("Failed to build lexer")]
    Build(#[from] finaut::BuildError),
    #[error("Failed to read standard input")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
struct Rule {
    identifier: String,
    regex: String,
}

fn parse_rule(s: &str) -> Result<Rule, Error> {
    let (identifier, regex) = s.split_once('=').ok_or_else(|| Error::BadRule(s.into()))?;
    Ok(Rule {
        identifier: identifier.into(),
        regex: regex.into(),
    })
}

#[derive(Debug, clap::Parser)]
struct Opts {
    /// Token rules as IDENTIFIER=REGEX, earlier rules winning ties
    #[arg(required = true, value_parser = parse_rule)]
    rules: Vec<Rule>,

    /// Print the lexer automaton before scanning
    #[arg(long)]
    print_automaton: bool,

    /// Omit tokens that matched no rule
    #[arg(short, long)]
    quiet: bool,

    /// Filter directives for diagnostic output
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    log_filter: String,
}

fn main() {
    let opts: Opts = clap::Parser::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&opts.log_filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    std::process::exit(match run(opts) {
        Ok(()) => 0,
        Err(e) => {
            error!("{e}");
            let mut source = std::error::Error::source(&e);
            while let Some(s) = source {
                error!("  caused by: {s}");
                source = s.source();
            }
            1
        },
    });
}

fn print_token(token: &Token) {
    println!(
        "{}\t{:?}",
        token.identifier().unwrap_or("-"),
        token.text
    );
}

fn run(opts: Opts) -> Result<(), Error> {
    let Opts {
        rules,
        print_automaton,
        quiet,
        log_filter: _,
    } = opts;

    let mut builder = LexerBuilder::new();
    for Rule { identifier, regex } in rules {
        let expr = RegularExpression::parse(&regex).map_err(|source| Error::Parse {
            identifier: identifier.clone(),
            source,
        })?;
        builder.add_expression(&expr, identifier)?;
    }

    let lexer = builder.build()?;
    debug!(states = lexer.states().len(), "Lexer ready");

    if print_automaton {
        print!("{}", **lexer);
    }

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    lexer
        .scan(&input)
        .filter(|t| !quiet || t.identifier.is_some())
        .for_each(|t| print_token(&t));

    Ok(())
}
