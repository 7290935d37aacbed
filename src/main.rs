use clap::{arg,crate_version,Command};
use std::path::Path;

const RCH: &str = "unreachable was reached";

/// form the default output path by swapping the input's extension
fn default_output(path_in: &str,ext: &str) -> String {
    Path::new(path_in).with_extension(ext).to_string_lossy().to_string()
}

/// open the input file, reporting a missing file in plain words
fn open_input(path_in: &str) -> Result<std::fs::File,Box<dyn std::error::Error>> {
    match std::fs::File::open(path_in) {
        Ok(f) => Ok(f),
        Err(e) if e.kind()==std::io::ErrorKind::NotFound => {
            eprintln!("input file {} does not exist",path_in);
            Err(Box::new(e))
        },
        Err(e) => Err(Box::new(e))
    }
}

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::init();
    let long_help =
"Examples:
---------
Compress:      `lzwpack compress -i notes.txt -o notes.lzw`
Expand:        `lzwpack expand -i notes.lzw -o notes.txt`
When -o is omitted the output path is the input path with its
extension replaced, `lzw` on compress and `txt` on expand.";

    let mut main_cmd = Command::new("lzwpack")
        .about("Compress and expand files with variable-width LZW")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(false))
        .about("compress a file"));

    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(false))
        .about("expand a file"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = match cmd.get_one::<String>("output") {
            Some(path) => path.to_string(),
            None => default_output(path_in,"lzw")
        };
        let mut in_file = open_input(path_in)?;
        let mut out_file = std::fs::File::create(&path_out)?;
        let (in_size,out_size) = lzwpack::lzw::compress(&mut in_file,&mut out_file)?;
        eprintln!("compressed {} into {}",in_size,out_size);
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = match cmd.get_one::<String>("output") {
            Some(path) => path.to_string(),
            None => default_output(path_in,"txt")
        };
        let mut in_file = open_input(path_in)?;
        let mut out_file = std::fs::File::create(&path_out)?;
        let (in_size,out_size) = lzwpack::lzw::expand(&mut in_file,&mut out_file)?;
        eprintln!("expanded {} into {}",in_size,out_size);
    }

    Ok(())
}
