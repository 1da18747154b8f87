// =-=-= main.rs =-=-=
// Command line wrapper for `huffblock::compress_all` / `decode_all`.

use huffblock::{compress_all, decode_all, Params};
use std::convert;
use std::env;
use std::fs;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::process;

const SUCCESS: i32 = 0;
const ERR_ARGS: i32 = 1;
const ERR_FILESYSTEM: i32 = 2;
const ERR_CODEC: i32 = 3;

const TAGLINE: &str = "huffc is a front-end for the huffblock entropy coder";
const VERSION: &str = concat!("version ", env!("CARGO_PKG_VERSION"));

fn fs_die(e: io::Error) -> ! {
    eprintln!("[filesystem error] {}", e);
    process::exit(ERR_FILESYSTEM);
}

fn synopsis_die() -> ! {
    eprintln!("{}", TAGLINE);
    eprintln!("   run 'huffc --help' for a full list of options");
    eprintln!("{}", VERSION);
    process::exit(ERR_ARGS);
}

const USAGE_MSG: &str = r#"
  usage: huffc [options] <input_path>

  options:
     --output <path>        specify output file
     --stdout    or   -c    output to standard out
     --decompress or  -d    decompress instead of compress
     --max-len   <1-12>     maximum Huffman codeword length (default 11)
     --four-stream          split each block into four bitstreams
     --verbose   or   -v    more extensive logging

  commands:
     --help                 print this message
     --version              print version string

  notes:
     To read input from stdin, specify '-' in place of the input path.
     If neither '--output' nor '--stdout' are specified, the file
     '<input_path>.huf' (compressing) or '<input_path>.out' (decompressing)
     is written.
"#;

fn help_die() -> ! {
    eprintln!("{}", TAGLINE);
    eprintln!("{}", USAGE_MSG);
    eprintln!("{}", VERSION);
    process::exit(SUCCESS);
}

fn version_die() -> ! {
    eprintln!("{}", VERSION);
    process::exit(SUCCESS);
}

fn args_error_die<S: convert::AsRef<str>>(msg: S) -> ! {
    eprintln!("{}", msg.as_ref());
    process::exit(ERR_ARGS);
}

enum ArgExpect {
    Any,
    NoArgs,
    OutPath,
    MaxLen,
}

enum Input {
    Unspecified,
    File(String),
    StdIn,
}

enum Output {
    Unspecified,
    File(String),
    StdOut,
}

struct Invocation {
    input: Input,
    output: Output,
    verbose: bool,
    decompress: bool,
    four_stream: bool,
    max_len: Option<u8>,
}

impl Invocation {
    fn blank() -> Self {
        Self {
            input: Input::Unspecified,
            output: Output::Unspecified,
            verbose: false,
            decompress: false,
            four_stream: false,
            max_len: None,
        }
    }

    fn with_input(&mut self, input: Input) {
        match self.input {
            Input::Unspecified => self.input = input,
            _ => args_error_die("Only one input may be specified"),
        }
    }

    fn with_output(&mut self, output: Output) {
        match self.output {
            Output::Unspecified => {
                self.output = output;
                return;
            }
            Output::StdOut => {
                if let Output::StdOut = output {
                    return;
                }
            }
            Output::File(_) => {}
        }
        args_error_die("Only one output may be specified");
    }

    fn params(&self) -> Params {
        let mut params = if self.four_stream() { Params::four_stream() } else { Params::default() };
        if let Some(len) = self.max_len {
            params = params.with_max_code_len(len);
        }
        params
    }

    fn four_stream(&self) -> bool {
        self.four_stream
    }
}

fn main() {
    let args = env::args().skip(1);

    if args.len() == 0 {
        synopsis_die();
    }

    let mut invocation = Invocation::blank();
    let mut exp = ArgExpect::Any;

    for a in args {
        match exp {
            ArgExpect::Any if a.starts_with("--") => match a.as_str() {
                "--help" => help_die(),
                "--version" => version_die(),
                "--verbose" => invocation.verbose = true,
                "--decompress" => invocation.decompress = true,
                "--four-stream" => invocation.four_stream = true,
                "--output" => exp = ArgExpect::OutPath,
                "--stdout" => invocation.with_output(Output::StdOut),
                "--max-len" => exp = ArgExpect::MaxLen,
                "--" => exp = ArgExpect::NoArgs,
                _ => args_error_die(&format!("Unrecognised argument {}", a)),
            },
            ArgExpect::Any if a.starts_with('-') => match a.as_str() {
                "-" => invocation.with_input(Input::StdIn),
                _ => {
                    for c in a.chars().skip(1) {
                        match c {
                            'c' => invocation.with_output(Output::StdOut),
                            'd' => invocation.decompress = true,
                            'v' => invocation.verbose = true,
                            _ => args_error_die(format!("Flag '{}' is not valid", c)),
                        }
                    }
                }
            },
            ArgExpect::Any | ArgExpect::NoArgs => invocation.with_input(Input::File(a)),
            ArgExpect::OutPath => {
                if a.starts_with('-') {
                    args_error_die("Argument '--output' requires a file path");
                }
                invocation.with_output(Output::File(a));
                exp = ArgExpect::Any;
            }
            ArgExpect::MaxLen => {
                let len: u8 = a.parse().unwrap_or_else(|_| args_error_die("--max-len requires an integer 1-12"));
                invocation.max_len = Some(len);
                exp = ArgExpect::Any;
            }
        }
    }

    if invocation.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("trace")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let mut reader: Box<dyn BufRead> = match &invocation.input {
        Input::Unspecified => args_error_die("An input must be specified"),
        Input::File(path) => {
            let inf = fs::File::open(path).unwrap_or_else(|err| fs_die(err));
            Box::new(BufReader::new(inf))
        }
        Input::StdIn => Box::new(BufReader::new(io::stdin())),
    };

    let default_suffix = if invocation.decompress { "out" } else { "huf" };
    let mut writer: Box<dyn Write> = match &invocation.output {
        Output::Unspecified => match &invocation.input {
            Input::File(inpath) => {
                let outf = fs::File::create(format!("{}.{}", inpath, default_suffix)).unwrap_or_else(|err| fs_die(err));
                Box::new(outf)
            }
            _ => Box::new(io::stdout()),
        },
        Output::File(outpath) => {
            let outf = fs::File::create(outpath).unwrap_or_else(|err| fs_die(err));
            Box::new(outf)
        }
        Output::StdOut => Box::new(io::stdout()),
    };

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).unwrap_or_else(|err| fs_die(err));

    let params = invocation.params();
    let result = if invocation.decompress {
        decode_all(&buffer, &params)
    } else {
        compress_all(&buffer, &params)
    };

    let output = result.unwrap_or_else(|err| {
        eprintln!("[codec error] {}", err);
        process::exit(ERR_CODEC);
    });

    if let Err(io_err) = writer.write_all(&output) {
        eprintln!("error writing output: {}", io_err);
        process::exit(ERR_CODEC);
    }

    process::exit(SUCCESS);
}
