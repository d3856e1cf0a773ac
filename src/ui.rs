// UI layer: the interactive read loop. It fetches one page, prints every
// movie, then waits for a single prev/next/quit command and repeats.
// Input and output are plain `BufRead`/`Write` values so the loop can be
// driven from memory in tests.

use std::io::{self, BufRead, BufReader, Read, Stdin, Stdout, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use crate::api::{ApiClient, FetchKind, Movie, MovieSource};
use crate::config::Settings;
use crate::error::Error;

/// One line of user input, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Prev,
    Next,
    Quit,
    Unknown,
}

impl Command {
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "p" | "prev" | "-" => Command::Prev,
            "n" | "next" | "+" => Command::Next,
            "q" | "quit" | "." => Command::Quit,
            _ => Command::Unknown,
        }
    }
}

/// What the loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Fetch(i64),
    Stop,
}

/// Page cursor plus the count of unrecognized commands seen so far.
#[derive(Debug, Clone)]
pub struct Session {
    page: i64,
    skipped: u32,
}

impl Session {
    /// The first fetch happens without a command and is counted as the one
    /// unrecognized input the session tolerates.
    pub fn new(page: i64) -> Self {
        Session { page, skipped: 1 }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    /// Advance the state machine. The counter is never reset, so any
    /// unrecognized command after the first fetch stops the session.
    pub fn apply(&mut self, command: Command) -> Step {
        match command {
            Command::Prev => self.page = self.page.saturating_sub(1),
            Command::Next => self.page = self.page.saturating_add(1),
            Command::Quit => return Step::Stop,
            Command::Unknown => self.skipped += 1,
        }
        if self.skipped > 1 {
            Step::Stop
        } else {
            Step::Fetch(self.page)
        }
    }
}

/// The interactive application: a movie source plus the streams it talks to.
pub struct App<R = BufReader<Stdin>, W = Stdout> {
    debug: bool,
    spinner: bool,
    source: Box<dyn MovieSource>,
    input: R,
    output: W,
}

impl App {
    /// Build the API client from `settings` and wire it to stdin/stdout.
    pub fn new(settings: Settings) -> Result<Self, Error> {
        let client = ApiClient::new(settings.client)?;
        Ok(App {
            debug: settings.debug,
            spinner: false,
            source: Box::new(client),
            input: BufReader::new(io::stdin()),
            output: io::stdout(),
        })
    }
}

impl<R: BufRead, W: Write> App<R, W> {
    pub fn with_source(mut self, source: impl MovieSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn with_input<R2: BufRead>(self, input: R2) -> App<R2, W> {
        App {
            debug: self.debug,
            spinner: self.spinner,
            source: self.source,
            input,
            output: self.output,
        }
    }

    pub fn with_output<W2: Write>(self, output: W2) -> App<R, W2> {
        App {
            debug: self.debug,
            spinner: self.spinner,
            source: self.source,
            input: self.input,
            output,
        }
    }

    /// Show a spinner on stderr while a request is in flight.
    pub fn with_spinner(mut self, enabled: bool) -> Self {
        self.spinner = enabled;
        self
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Run the loop starting at `page` of list `kind` until the user quits,
    /// input ends, or a fetch fails. Errors are printed, never returned.
    pub fn run(&mut self, page: i64, kind: &str) {
        let kind = kind.parse::<FetchKind>().map_err(|_| kind.to_string());
        let mut session = Session::new(page);

        if !self.show(session.page(), &kind) {
            return;
        }
        loop {
            let Some(line) = self.read_command() else {
                return;
            };
            let command = Command::parse(&line);
            debug!(?command, "command received");
            match session.apply(command) {
                Step::Stop => return,
                Step::Fetch(page) => {
                    if !self.show(page, &kind) {
                        return;
                    }
                }
            }
        }
    }

    /// Release the movie source.
    pub fn close(mut self) -> Result<(), Error> {
        self.source.close()
    }

    fn read_command(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(err) => {
                warn!(%err, "cannot read command");
                None
            }
        }
    }

    /// Fetch and render one page; `false` means the loop should stop.
    fn show(&mut self, page: i64, kind: &Result<FetchKind, String>) -> bool {
        let rendered = match self.fetch(page, kind) {
            Ok(movies) => self.render_page(page, &movies).map(|()| true),
            Err(err) => self.render_error(&err).map(|()| false),
        };
        rendered.unwrap_or_else(|err| {
            warn!(%err, "cannot write output");
            false
        })
    }

    fn fetch(&self, page: i64, kind: &Result<FetchKind, String>) -> Result<Vec<Movie>, Error> {
        let kind = kind.clone().map_err(Error::UnknownKind)?;
        if page < 1 {
            return Err(Error::InvalidPage(page));
        }

        let spinner = self.spinner.then(|| start_spinner(kind, page));
        let result = self.source.movies(kind, page);
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        result
    }

    fn render_page(&mut self, page: i64, movies: &[Movie]) -> io::Result<()> {
        writeln!(self.output)?;
        for (i, movie) in movies.iter().enumerate() {
            write_movie(&mut self.output, movie)?;
            if i + 1 < movies.len() {
                self.output.flush()?;
                self.pause();
            }
        }
        write!(self.output, "Current page is {page}, prev/next/quit? ")?;
        self.output.flush()
    }

    fn render_error(&mut self, err: &Error) -> io::Result<()> {
        if self.debug {
            writeln!(self.output, "{}", err.diagnostic())?;
        } else {
            writeln!(self.output, "{}", err.public())?;
        }
        self.output.flush()
    }

    // Wait for a single key press between movies.
    fn pause(&mut self) {
        let mut byte = [0u8; 1];
        if let Err(err) = self.input.read(&mut byte) {
            warn!(%err, "cannot read from input");
        }
    }
}

fn write_movie(out: &mut impl Write, movie: &Movie) -> io::Result<()> {
    writeln!(
        out,
        "---- {:?} ----\n * Released: {}\n * Votes: {}\n * Popularity: {:.2}\n > {}",
        movie.title, movie.release_date, movie.vote_count, movie.popularity, movie.overview
    )
}

fn start_spinner(kind: FetchKind, page: i64) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Fetching {kind} movies, page {page}..."));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
