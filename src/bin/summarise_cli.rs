use anyhow::{anyhow, bail, Context, Result};
use std::{
    collections::BTreeMap,
    env, fs,
    io::{self, IsTerminal, Read},
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};
use summariser::api::types::{ErrorResponse, SummariseRequest, SummariseResponse};

const USAGE: &str = "\
usage: summarise-cli [--length short|medium|long] [--api-url URL]
                     [--sample NAME | --file PATH | TEXT...]
       summarise-cli --list-samples

Text is read from --sample, --file, the trailing arguments, or stdin.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SummaryLength {
    Short,
    Medium,
    Long,
}

impl SummaryLength {
    fn parse(raw: &str) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            other => bail!("unknown length '{other}' (expected short, medium or long)"),
        }
    }

    fn max_words(self) -> i64 {
        match self {
            Self::Short => 30,
            Self::Medium => 80,
            Self::Long => 150,
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    length: Option<SummaryLength>,
    api_url: Option<String>,
    sample: Option<String>,
    file: Option<PathBuf>,
    list_samples: bool,
    text: Vec<String>,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    while let Some(arg) = raw.next() {
        let mut value = |flag: &str| raw.next().ok_or_else(|| anyhow!("{flag} needs a value"));
        match arg.as_str() {
            "--length" | "-l" => args.length = Some(SummaryLength::parse(&value("--length")?)?),
            "--api-url" => args.api_url = Some(value("--api-url")?),
            "--sample" | "-s" => args.sample = Some(value("--sample")?),
            "--file" | "-f" => args.file = Some(PathBuf::from(value("--file")?)),
            "--list-samples" => args.list_samples = true,
            "--help" | "-h" => bail!("{USAGE}"),
            flag if flag.starts_with("--") => bail!("unknown flag {flag}\n\n{USAGE}"),
            text => args.text.push(text.to_string()),
        }
    }
    Ok(args)
}

/// `news_article.txt` -> "News Article"
fn sample_title(stem: &str) -> String {
    stem.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn load_samples(dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let mut samples = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(samples);
    }
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            samples.insert(stem.to_string(), path.clone());
        }
    }
    Ok(samples)
}

fn find_sample<'a>(samples: &'a BTreeMap<String, PathBuf>, name: &str) -> Option<&'a PathBuf> {
    samples.get(name).or_else(|| {
        samples
            .iter()
            .find(|(stem, _)| sample_title(stem).eq_ignore_ascii_case(name))
            .map(|(_, path)| path)
    })
}

fn read_input(args: &Args, samples_dir: &Path) -> Result<String> {
    if let Some(name) = &args.sample {
        let samples = load_samples(samples_dir)?;
        let path = find_sample(&samples, name)
            .ok_or_else(|| anyhow!("no sample named '{name}' in {}", samples_dir.display()))?;
        return fs::read_to_string(path).with_context(|| format!("reading {}", path.display()));
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path).with_context(|| format!("reading {}", path.display()));
    }
    if !args.text.is_empty() {
        return Ok(args.text.join(" "));
    }
    if io::stdin().is_terminal() {
        bail!("no input text\n\n{USAGE}");
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

/// `google-t5/t5-small` -> `t5-small`
fn short_model_name(model: &str) -> &str {
    model.rsplit('/').next().unwrap_or(model)
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = parse_args(env::args().skip(1))?;
    let samples_dir =
        PathBuf::from(dotenvy::var("SAMPLE_DIR").unwrap_or_else(|_| "sample_texts".into()));

    if args.list_samples {
        let samples = load_samples(&samples_dir)?;
        if samples.is_empty() {
            println!("no samples in {}", samples_dir.display());
        }
        for stem in samples.keys() {
            println!("{stem:<24} {}", sample_title(stem));
        }
        return Ok(());
    }

    let text = read_input(&args, &samples_dir)?;
    if text.trim().is_empty() {
        bail!("Please enter some text first.");
    }

    let api_url = args
        .api_url
        .clone()
        .or_else(|| dotenvy::var("API_URL").ok())
        .unwrap_or_else(|| "http://localhost:8000".into());
    let max_words = args.length.unwrap_or(SummaryLength::Medium).max_words();

    eprintln!("⏳ Generating summary...");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()?;
    let resp = client
        .post(format!("{}/summarise", api_url.trim_end_matches('/')))
        .json(&SummariseRequest {
            text,
            max_words: Some(max_words),
        })
        .send()
        .await
        .map_err(|e| {
            if e.is_connect() {
                anyhow!("Cannot reach the backend API at {api_url}. Is it running?")
            } else {
                anyhow!("request failed: {e}")
            }
        })?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.detail)
            .unwrap_or(body);
        bail!("API error ({status}): {detail}");
    }

    let data: SummariseResponse = resp.json().await.context("decoding API response")?;

    println!("Summary\n-------\n{}\n", data.summary);
    println!("Model: {}", short_model_name(&data.model));
    println!("Time:  {:.0} ms", data.took_ms);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
