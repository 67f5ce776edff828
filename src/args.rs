use clap::Parser;

/// This program reshapes survey crosstab exports into a long table of subgroup frequencies.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the survey export.
    /// For more information about the file format, read the documentation of the survey_tables crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference output in CSV format. If provided, surveytab will
    /// check that the produced table matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the long table will be written in CSV format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The survey export (xlsx file or directory of csv files). Setting this option
    /// overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default xlsx) The type of the input: xlsx or csv.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (list of comma-separated values) The codes of the questions to process, in order.
    /// Each question is read from the worksheet of the same name.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub questions: Option<Vec<String>>,

    /// (default 15) The number of rows to skip at the top of every worksheet.
    #[clap(long, value_parser)]
    pub header_rows: Option<usize>,

    /// (file path, 'stdout' or empty) If specified, a summary of the run will be written in JSON format
    /// to the given location.
    #[clap(long, value_parser)]
    pub summary: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
