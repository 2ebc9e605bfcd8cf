use clap::Parser;

/// This is a ranked voting (STV) tabulation program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The CSV export containing the election data: one header row
    /// describing the races and candidates, then one row per ballot. The
    /// expected format is the spreadsheet export of a Google Forms ranking
    /// poll; see the documentation for details.
    #[clap(value_parser)]
    pub input: String,

    /// If passed as an argument, prints the full round-by-round results for
    /// each race instead of just the winners.
    #[clap(long, takes_value = false)]
    pub details: bool,

    /// (ceiling, add_one_floor or fractional) How to round the fractional vote
    /// threshold during tabulation. The default (add_one_floor) should be used
    /// for most cases.
    #[clap(long, value_parser)]
    pub round_mode: Option<String>,

    /// If specified, seeds the random source used to break elimination ties so
    /// that the run is reproducible.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    /// (file path or 'stdout') If specified, the summary of the elections will
    /// be written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the expected summary of the
    /// elections in JSON format. If provided, stvtally will check that the
    /// tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard
    /// output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
