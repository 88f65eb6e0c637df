use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use log::info;

use knn_vote::{parse_features, Dataset, KnnClassifier, KnnConfig};

/// Classify observations by majority vote among their k nearest training rows.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Training data: comma-separated feature values followed by a label,
    /// one observation per line.
    #[arg(long)]
    train: PathBuf,
    /// Number of nearest neighbors. Asked for interactively when omitted.
    #[arg(short, long)]
    k: Option<usize>,
    /// Labeled test file to classify. The report is printed and the program
    /// exits without entering the menu.
    #[arg(long)]
    test: Option<PathBuf>,
    /// Refuse to predict when k exceeds the number of training rows.
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<(), String> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let dataset = Dataset::<String>::from_path(&args.train)
        .map_err(|e| format!("cannot load {}: {e}", args.train.display()))?;

    let mut input = io::stdin().lock();
    let mut output = io::stdout().lock();

    let k = match args.k {
        Some(k) => k,
        None => match read_k(
            &mut input,
            &mut output,
            "Enter the number K (number of nearest neighbors): ",
        )
        .map_err(|e| e.to_string())?
        {
            Some(k) => k,
            None => return Ok(()),
        },
    };
    let knn = KnnClassifier::new(dataset, KnnConfig::new(k).with_strict(args.strict))
        .map_err(|e| e.to_string())?;

    if let Some(test) = args.test {
        let test_set = Dataset::<String>::from_path(&test)
            .map_err(|e| format!("cannot load {}: {e}", test.display()))?;
        let report = knn.evaluate(&test_set).map_err(|e| e.to_string())?;
        return writeln!(output, "{report}").map_err(|e| e.to_string());
    }

    let mut session = Session {
        knn,
        input,
        output,
    };
    session.run().map_err(|e| e.to_string())
}

/// Prompt until a positive integer is entered. `None` on end of input.
fn read_k<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> io::Result<Option<usize>> {
    loop {
        writeln!(output, "{prompt}")?;
        output.flush()?;
        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        match line.trim().parse::<usize>() {
            Ok(k) if k > 0 => return Ok(Some(k)),
            _ => writeln!(output, "Invalid K {:?}: expected a positive integer", line.trim())?,
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
}

/// Interactive menu over a trained classifier.
struct Session<R, W> {
    knn: KnnClassifier<String>,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(
                self.output,
                "\nChoose an option:\n\
                 a) Classify all observations from the test set\n\
                 b) Classify an observation given in the console\n\
                 c) Change k (currently {})\n\
                 d) Exit",
                self.knn.k()
            )?;
            self.output.flush()?;
            let Some(option) = read_line(&mut self.input)? else {
                return Ok(());
            };
            match option.trim() {
                "a" => self.classify_file()?,
                "b" => self.classify_observation()?,
                "c" => self.change_k()?,
                "d" => return Ok(()),
                other => writeln!(self.output, "Unknown option {other:?}")?,
            }
        }
    }

    fn classify_file(&mut self) -> io::Result<()> {
        writeln!(self.output, "Enter path to the test file: ")?;
        self.output.flush()?;
        let Some(path) = read_line(&mut self.input)? else {
            return Ok(());
        };
        let result =
            Dataset::<String>::from_path(path.trim()).and_then(|test| self.knn.evaluate(&test));
        match result {
            Ok(report) => writeln!(self.output, "{report}"),
            Err(e) => writeln!(self.output, "Error: {e}"),
        }
    }

    fn classify_observation(&mut self) -> io::Result<()> {
        writeln!(
            self.output,
            "Enter an observation separated by commas (without the label): "
        )?;
        self.output.flush()?;
        let Some(line) = read_line(&mut self.input)? else {
            return Ok(());
        };
        match parse_features(&line).and_then(|query| self.knn.predict(&query)) {
            Ok(label) => writeln!(self.output, "Predicted label: {label}"),
            Err(e) => writeln!(self.output, "Error: {e}"),
        }
    }

    fn change_k(&mut self) -> io::Result<()> {
        let Some(k) = read_k(&mut self.input, &mut self.output, "Enter the new value of K: ")? else {
            return Ok(());
        };
        match self.knn.set_k(k) {
            Ok(()) => {
                info!("k set to {k}");
                Ok(())
            }
            Err(e) => writeln!(self.output, "Error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knn_vote::LabeledRow;
    use std::fs;
    use tempdir::TempDir;

    fn session(script: &str) -> Session<&[u8], Vec<u8>> {
        let dataset = Dataset::from_rows(vec![
            LabeledRow::new(vec![0.0, 0.0], "A".to_string()),
            LabeledRow::new(vec![10.0, 10.0], "B".to_string()),
            LabeledRow::new(vec![11.0, 11.0], "B".to_string()),
        ])
        .unwrap();
        Session {
            knn: KnnClassifier::new(dataset, KnnConfig::new(1)).unwrap(),
            input: script.as_bytes(),
            output: Vec::new(),
        }
    }

    fn transcript(session: Session<&[u8], Vec<u8>>) -> String {
        String::from_utf8(session.output).unwrap()
    }

    #[test]
    fn test_classify_observation() {
        let mut s = session("b\n1,1\nd\n");
        s.run().unwrap();
        assert!(transcript(s).contains("Predicted label: A"));
    }

    #[test]
    fn test_bad_input_keeps_session_alive() {
        let mut s = session("x\nb\n1,oops\nb\n1\nb\n9,9\n");
        s.run().unwrap();
        let out = transcript(s);
        assert!(out.contains("Unknown option \"x\""));
        assert!(out.contains("cannot parse \"oops\""));
        assert!(out.contains("dimension mismatch"));
        assert!(out.contains("Predicted label: B"));
    }

    #[test]
    fn test_change_k_retries_until_valid() {
        let mut s = session("c\n0\nthree\n3\nb\n1,1\nd\n");
        s.run().unwrap();
        assert_eq!(s.knn.k(), 3);
        let out = transcript(s);
        assert!(out.contains("Invalid K \"0\""));
        assert!(out.contains("Invalid K \"three\""));
        assert!(out.contains("Predicted label: B"));
    }

    #[test]
    fn test_classify_file() {
        let dir = TempDir::new("knn_session").unwrap();
        let path = dir.path().join("test.csv");
        fs::write(&path, "1,1,A\n9,9,A\n").unwrap();

        let script = format!(
            "a\n{}\na\n{}\nd\n",
            path.display(),
            dir.path().join("missing.csv").display()
        );
        let mut s = session(&script);
        s.run().unwrap();
        let out = transcript(s);
        assert!(out.contains("Expected=A, Predicted=A\nExpected=A, Predicted=B\nAccuracy: 0.5"));
        assert!(out.contains("Error: "));
    }

    #[test]
    fn test_end_of_input_exits() {
        let mut s = session("b\n");
        s.run().unwrap();

        let mut input: &[u8] = b"";
        let mut output = Vec::new();
        assert_eq!(read_k(&mut input, &mut output, "K?").unwrap(), None);
    }
}
