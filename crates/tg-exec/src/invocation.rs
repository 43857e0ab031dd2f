use tg_types::ContentHash;

/// Control flags passed to every executor run.
pub mod flags {
    pub const GET_DEPENDENCIES: &str = "--get-dependencies";
    pub const PUT_OUTPUT: &str = "--put-output";
    pub const CLEANUP: &str = "--cleanup";
    pub const TIMELOG: &str = "--timelog";
}

/// Arguments and pass-through settings for one executor run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    args: Vec<String>,
    storage_backend: String,
}

impl Invocation {
    /// Fixed flags, then `--timelog` if requested, then every hash in order.
    pub fn for_batch<'a>(
        hashes: impl IntoIterator<Item = &'a ContentHash>,
        timelog: bool,
        storage_backend: impl Into<String>,
    ) -> Self {
        let mut args: Vec<String> = [flags::GET_DEPENDENCIES, flags::PUT_OUTPUT, flags::CLEANUP]
            .into_iter()
            .map(String::from)
            .collect();
        if timelog {
            args.push(flags::TIMELOG.to_string());
        }
        args.extend(hashes.into_iter().map(|h| h.as_str().to_string()));
        Self {
            args,
            storage_backend: storage_backend.into(),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Opaque storage backend identifier from the request.
    pub fn storage_backend(&self) -> &str {
        &self.storage_backend
    }

    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}
