//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::rc::Rc;
use std::sync::{Arc, Mutex, MutexGuard as StdMutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use crate::channel::{ChannelError, CommandChannel, CommandOutput, CommandRunner};

/// Scripted process runner that returns pre-seeded outputs in FIFO order.
///
/// Used to drive [`crate::channel::SshChannel`] without spawning `ssh`.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Rc<RefCell<VecDeque<CommandOutput>>>,
    invocations: Rc<RefCell<Vec<CommandInvocation>>>,
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
}

impl CommandInvocation {
    /// Returns the arguments as lossy UTF-8 strings.
    #[must_use]
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.borrow().clone()
    }

    /// Pushes an explicit command output response.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.responses.borrow_mut().push_back(CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        });
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, ChannelError> {
        self.invocations.borrow_mut().push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ChannelError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response available"),
            })
    }
}

/// Scripted command channel that records every command text it receives.
#[derive(Clone, Debug, Default)]
pub struct ScriptedChannel {
    responses: Rc<RefCell<VecDeque<Result<CommandOutput, ChannelError>>>>,
    commands: Rc<RefCell<Vec<String>>>,
}

impl ScriptedChannel {
    /// Creates a channel with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response carrying `stdout`.
    pub fn push_success(&self, stdout: impl Into<String>) {
        self.responses
            .borrow_mut()
            .push_back(Ok(CommandOutput::success(stdout)));
    }

    /// Queues a failed response.
    pub fn push_failure(&self, code: i32, stderr: impl Into<String>) {
        self.responses
            .borrow_mut()
            .push_back(Ok(CommandOutput::failure(code, stderr)));
    }

    /// Queues a transport failure.
    pub fn push_transport_error(&self) {
        self.responses
            .borrow_mut()
            .push_back(Err(ChannelError::Transport {
                host: String::from("scripted"),
                status_text: String::from("255"),
                stderr: String::from("Connection reset by peer"),
            }));
    }

    /// Returns every command received so far.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }
}

impl CommandChannel for ScriptedChannel {
    fn execute(&self, command: &str) -> Result<CommandOutput, ChannelError> {
        self.commands.borrow_mut().push(command.to_owned());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ChannelError::Spawn {
                    program: String::from("scripted"),
                    message: format!("no scripted response for `{command}`"),
                })
            })
    }
}

const MUTATING_VERBS: [&str; 7] = [
    "add", "remove", "enable", "disable", "cron-job", "link", "unlink",
];

#[derive(Debug, Default)]
struct FakeHostState {
    apps: BTreeMap<String, BTreeSet<String>>,
    certificates: BTreeSet<String>,
    renewal_job: bool,
    services: BTreeMap<(String, String), BTreeMap<String, Option<String>>>,
    failures: Vec<(String, String)>,
    commands: Vec<String>,
}

/// In-memory simulation of the managed host tool.
///
/// Answers the same commands the fact extractors and mutations issue, in the
/// host tool's text formats, so reconcilers can be exercised end to end.
#[derive(Clone, Debug, Default)]
pub struct FakeHost {
    state: Arc<Mutex<FakeHostState>>,
}

impl FakeHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StdMutexGuard<'_, FakeHostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates application `app`.
    #[must_use]
    pub fn with_app(self, app: &str) -> Self {
        self.lock().apps.entry(app.to_owned()).or_default();
        self
    }

    /// Binds `domain` to `app`, creating the app when needed.
    #[must_use]
    pub fn with_domain(self, app: &str, domain: &str) -> Self {
        self.lock()
            .apps
            .entry(app.to_owned())
            .or_default()
            .insert(domain.to_owned());
        self
    }

    /// Marks certificates active for `app`.
    #[must_use]
    pub fn with_certificate(self, app: &str) -> Self {
        self.lock().certificates.insert(app.to_owned());
        self
    }

    /// Installs the renewal job.
    #[must_use]
    pub fn with_renewal_job(self) -> Self {
        self.lock().renewal_job = true;
        self
    }

    /// Creates service `name` of plugin `kind`.
    #[must_use]
    pub fn with_service(self, kind: &str, name: &str) -> Self {
        self.lock()
            .services
            .entry((kind.to_owned(), name.to_owned()))
            .or_default();
        self
    }

    /// Links an existing or new service to `app`.
    #[must_use]
    pub fn with_link(self, kind: &str, name: &str, app: &str, alias: Option<&str>) -> Self {
        self.lock()
            .services
            .entry((kind.to_owned(), name.to_owned()))
            .or_default()
            .insert(app.to_owned(), alias.map(str::to_owned));
        self
    }

    /// Makes the next command starting with `prefix` fail with `stderr`.
    pub fn fail_next(&self, prefix: &str, stderr: &str) {
        self.lock()
            .failures
            .push((prefix.to_owned(), stderr.to_owned()));
    }

    /// Removes `domain` from `app` behind the reconciler's back.
    pub fn drop_domain(&self, app: &str, domain: &str) {
        if let Some(domains) = self.lock().apps.get_mut(app) {
            domains.remove(domain);
        }
    }

    /// Domains bound to `app`.
    #[must_use]
    pub fn domains(&self, app: &str) -> BTreeSet<String> {
        self.lock().apps.get(app).cloned().unwrap_or_default()
    }

    /// Whether certificates are active for `app`.
    #[must_use]
    pub fn certificate_active(&self, app: &str) -> bool {
        self.lock().certificates.contains(app)
    }

    /// Whether the renewal job is installed.
    #[must_use]
    pub fn renewal_job_installed(&self) -> bool {
        self.lock().renewal_job
    }

    /// Alias of the link between `name` and `app`; `None` when not linked,
    /// `Some(None)` when linked without alias.
    #[must_use]
    pub fn link_alias(&self, kind: &str, name: &str, app: &str) -> Option<Option<String>> {
        self.lock()
            .services
            .get(&(kind.to_owned(), name.to_owned()))
            .and_then(|links| links.get(app).cloned())
    }

    /// Every command received so far.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.lock().commands.clone()
    }

    /// Number of state-changing commands received so far.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.lock()
            .commands
            .iter()
            .filter(|command| {
                command
                    .split(' ')
                    .next()
                    .and_then(|head| head.split_once(':'))
                    .is_some_and(|(_, verb)| MUTATING_VERBS.contains(&verb))
            })
            .count()
    }
}

impl CommandChannel for FakeHost {
    fn execute(&self, command: &str) -> Result<CommandOutput, ChannelError> {
        let mut state = self.lock();
        state.commands.push(command.to_owned());

        if let Some(index) = state
            .failures
            .iter()
            .position(|(prefix, _)| command.starts_with(prefix.as_str()))
        {
            let (_, stderr) = state.failures.remove(index);
            return Ok(CommandOutput::failure(1, stderr));
        }

        let tokens: Vec<&str> = command.split(' ').collect();
        let Some((namespace, verb)) = tokens.first().and_then(|head| head.split_once(':')) else {
            return Ok(CommandOutput::failure(
                1,
                format!(" !     `{command}` is not a dokku command.\n"),
            ));
        };
        let args = tokens.get(1..).unwrap_or_default();
        Ok(state.respond(namespace, verb, args))
    }
}

impl FakeHostState {
    fn respond(&mut self, namespace: &str, verb: &str, args: &[&str]) -> CommandOutput {
        match (namespace, verb, args) {
            ("domains", "report", [app]) => self.domains_report(app),
            ("domains", "add", [app, domain]) => self.domains_add(app, domain),
            ("domains", "remove", [app, domain]) => {
                if let Some(domains) = self.apps.get_mut(*app) {
                    domains.remove(*domain);
                }
                CommandOutput::success(format!("-----> Removed {domain} from {app}\n"))
            }
            ("letsencrypt", "active", [app]) => {
                CommandOutput::success(format!("{}\n", self.certificates.contains(*app)))
            }
            ("letsencrypt", "enable", [app]) => {
                self.certificates.insert((*app).to_owned());
                CommandOutput::success(format!("=====> Let's Encrypt {app}\n"))
            }
            ("letsencrypt", "disable", [app]) => {
                self.certificates.remove(*app);
                CommandOutput::success(format!("-----> Disabling letsencrypt for {app}\n"))
            }
            ("letsencrypt", "cron-job", ["--add"]) => {
                self.renewal_job = true;
                CommandOutput::success("-----> Added cron job to dokku's crontab.\n")
            }
            ("cron", "list", ["--global"]) => self.cron_list(),
            (kind, "exists", [name]) => {
                if self.services.contains_key(&key(kind, name)) {
                    CommandOutput::success("")
                } else {
                    CommandOutput::failure(1, format!(" !     Service {name} does not exist\n"))
                }
            }
            (kind, "linked", [name, app]) => self.linked(kind, name, app),
            (kind, "link", [name, app, rest @ ..]) => {
                let alias = match rest {
                    [] => None,
                    ["--alias", alias] => Some((*alias).to_owned()),
                    _ => return CommandOutput::failure(1, " !     Invalid flags\n"),
                };
                self.link(kind, name, app, alias)
            }
            (kind, "unlink", [name, app]) => self.unlink(kind, name, app),
            _ => CommandOutput::failure(
                1,
                format!(" !     `{namespace}:{verb}` is not a dokku command.\n"),
            ),
        }
    }

    fn domains_report(&self, app: &str) -> CommandOutput {
        let Some(domains) = self.apps.get(app) else {
            return CommandOutput::failure(1, format!(" !     App {app} does not exist\n"));
        };
        let vhosts = domains.iter().cloned().collect::<Vec<_>>().join(" ");
        CommandOutput::success(format!(
            "=====> {app} domains information\n       Domains app enabled:           true\n       Domains app vhosts:            {vhosts}\n       Domains global enabled:        true\n       Domains global vhosts:         \n"
        ))
    }

    fn domains_add(&mut self, app: &str, domain: &str) -> CommandOutput {
        let Some(domains) = self.apps.get_mut(app) else {
            return CommandOutput::failure(1, format!(" !     App {app} does not exist\n"));
        };
        domains.insert(domain.to_owned());
        CommandOutput::success(format!("-----> Added {domain} to {app}\n"))
    }

    fn cron_list(&self) -> CommandOutput {
        let mut listing = String::from("ID  Schedule  Command\n");
        if self.renewal_job {
            listing.push_str("global-renew  @daily  dokku letsencrypt:auto-renew\n");
        }
        CommandOutput::success(listing)
    }

    fn linked(&self, kind: &str, name: &str, app: &str) -> CommandOutput {
        match self.services.get(&key(kind, name)) {
            None => CommandOutput::failure(1, format!(" !     Service {name} does not exist\n")),
            Some(links) if links.contains_key(app) => CommandOutput::success(""),
            Some(_) => {
                CommandOutput::failure(1, format!(" !     Service {name} is not linked to {app}\n"))
            }
        }
    }

    fn link(&mut self, kind: &str, name: &str, app: &str, alias: Option<String>) -> CommandOutput {
        let Some(links) = self.services.get_mut(&key(kind, name)) else {
            return CommandOutput::failure(1, format!(" !     Service {name} does not exist\n"));
        };
        if links.contains_key(app) {
            return CommandOutput::failure(1, format!(" !     Already linked as {kind}_URL\n"));
        }
        links.insert(app.to_owned(), alias);
        CommandOutput::success(format!("-----> Setting config vars for {app}\n"))
    }

    fn unlink(&mut self, kind: &str, name: &str, app: &str) -> CommandOutput {
        let Some(links) = self.services.get_mut(&key(kind, name)) else {
            return CommandOutput::failure(1, format!(" !     Service {name} does not exist\n"));
        };
        if links.remove(app).is_none() {
            return CommandOutput::failure(1, format!(" !     Not linked to app {app}\n"));
        }
        CommandOutput::success(format!("-----> Unsetting config vars for {app}\n"))
    }
}

fn key(kind: &str, name: &str) -> (String, String) {
    (kind.to_owned(), name.to_owned())
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
