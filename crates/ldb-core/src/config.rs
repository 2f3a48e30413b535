use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::{
    draw::session::DrawTiming, errors::Error, messaging::throttled::ThrottleConfig, Result,
};

/// Typed configuration for the bot.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub config_file: PathBuf,
    pub messages: Messages,
    pub timing: DrawTiming,
    pub throttle: ThrottleConfig,
}

/// User-facing message templates.
///
/// Placeholders use `{{.key}}`; see each field for the keys it receives.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Messages {
    /// `joinDuration` (minutes).
    pub lucky_draw_start: String,
    /// `timeLeft` (minutes).
    pub time_left_for_join: String,
    /// `quantity`, `prize`.
    pub will_choose_number_of_persons: String,
    /// `quantity`, `prize`.
    pub will_choose_one_person: String,
    /// `place`, `place_en`, `place_number`, `winner`.
    pub winner_is: String,
    /// `numberOfMembers`.
    pub there_are_n_members_joined: String,
    /// `numberOfMembers`.
    pub there_is_one_member_joined: String,
    pub no_one_joined: String,
    pub the_draw_is_over: String,
    pub the_draw_is_not_started_yet: String,
    pub the_draw_is_already_started_and_has_not_stopped_yet: String,
    /// `prize`, `winner`, `organizer`, `chat`.
    pub notify_winner: String,
    pub all_members_got_their_prize: String,
    /// `organizer`.
    pub draw_cancelled: String,
    /// `status`, `opened`, `members`, `prizes`.
    pub draw_status: String,
    /// `reason`.
    pub draw_unavailable: String,

    pub private_chat_not_allowed: String,
    pub not_admin: String,
    pub admin_check_failed: String,
    pub greeting: String,
    pub help: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            lucky_draw_start: "🎉 <b>Lucky draw started!</b>\n\nReply to this message or send /joindraw to join. \
Winners will be drawn in {{.joinDuration}} minute(s)."
                .to_string(),
            time_left_for_join: "⏳ {{.timeLeft}} minute(s) left to join the draw!".to_string(),
            will_choose_number_of_persons: "🎁 Drawing {{.quantity}} winners of <b>{{.prize}}</b>..."
                .to_string(),
            will_choose_one_person: "🎁 Drawing 1 winner of <b>{{.prize}}</b>...".to_string(),
            winner_is: "🏆 The {{.place}} winner is {{.winner}}!".to_string(),
            there_are_n_members_joined: "👥 {{.numberOfMembers}} members joined the draw.".to_string(),
            there_is_one_member_joined: "👥 {{.numberOfMembers}} member joined the draw.".to_string(),
            no_one_joined: "😶 No one joined the draw.".to_string(),
            the_draw_is_over: "🏁 The draw is over. Thanks for joining!".to_string(),
            the_draw_is_not_started_yet: "The draw is not started yet.".to_string(),
            the_draw_is_already_started_and_has_not_stopped_yet:
                "A draw is already running in this chat.".to_string(),
            notify_winner: "🎉 Congratulations {{.winner}}! You won <b>{{.prize}}</b> in {{.chat}}. \
Please contact {{.organizer}} to claim it."
                .to_string(),
            all_members_got_their_prize: "Every participant already got a prize.".to_string(),
            draw_cancelled: "🚫 The draw was cancelled by {{.organizer}}.".to_string(),
            draw_status: "📊 <b>Draw status</b>: {{.status}}\nStarted: {{.opened}}\nParticipants: {{.members}}\n{{.prizes}}"
                .to_string(),
            draw_unavailable: "The draw could not be started, please try again later.".to_string(),
            private_chat_not_allowed: "A lucky draw can not run in a private chat.".to_string(),
            not_admin: "You are not an admin.".to_string(),
            admin_check_failed: "Could not verify admin status, please try again.".to_string(),
            greeting: "Hi, I'm a lottery bot\n\nPlease enter /help to see the usage".to_string(),
            help: "<b>Commands</b>\n\
/luckydraw - start a draw (admins). Put one prize per line below the command:\n\
<code>/luckydraw\n1 x Gold\n2 x Silver</code>\n\
/joindraw - join the running draw (or reply to the draw message)\n\
/drawstatus - show the current draw\n\
/canceldraw - cancel a draw that is still open (admins)\n\
/toss - toss the cups"
                .to_string(),
        }
    }
}

/// Pacing knobs as they appear in the YAML file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TimingFile {
    join_window_secs: Option<u64>,
    prize_announce_delay_ms: Option<u64>,
    winner_announce_delay_ms: Option<u64>,
    report_interval_secs: Option<u64>,
    report_threshold_secs: Option<u64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    messages: Messages,
    timing: TimingFile,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        load_dotenv_if_present(Path::new(".env.local"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let config_file =
            PathBuf::from(env_str("LUCKY_DRAW_CONFIG").unwrap_or("config.yaml".to_string()));
        let file = match fs::read_to_string(&config_file) {
            Ok(text) => parse_config_yaml(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    "config file {} not found, using built-in messages",
                    config_file.display()
                );
                FileConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        let timing = resolve_timing(&file.timing, env_u64);

        let defaults = ThrottleConfig::default();
        let throttle = ThrottleConfig {
            global_min_interval: env_u64("THROTTLE_GLOBAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.global_min_interval),
            per_chat_min_interval: env_u64("THROTTLE_PER_CHAT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.per_chat_min_interval),
        };

        Ok(Self {
            telegram_bot_token,
            config_file,
            messages: file.messages,
            timing,
            throttle,
        })
    }
}

fn parse_config_yaml(text: &str) -> Result<FileConfig> {
    if text.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    Ok(serde_yaml::from_str(text)?)
}

/// Environment wins over the YAML file, which wins over the built-in defaults.
fn resolve_timing(file: &TimingFile, env: impl Fn(&str) -> Option<u64>) -> DrawTiming {
    let d = DrawTiming::default();
    let secs = |key: &str, from_file: Option<u64>, default: Duration| {
        env(key)
            .or(from_file)
            .map(Duration::from_secs)
            .unwrap_or(default)
    };
    let millis = |key: &str, from_file: Option<u64>, default: Duration| {
        env(key)
            .or(from_file)
            .map(Duration::from_millis)
            .unwrap_or(default)
    };

    DrawTiming {
        join_window: secs("JOIN_WINDOW_SECS", file.join_window_secs, d.join_window),
        prize_announce_delay: millis(
            "PRIZE_ANNOUNCE_DELAY_MS",
            file.prize_announce_delay_ms,
            d.prize_announce_delay,
        ),
        inter_winner_delay: millis(
            "WINNER_ANNOUNCE_DELAY_MS",
            file.winner_announce_delay_ms,
            d.inter_winner_delay,
        ),
        report_interval: secs(
            "REPORT_INTERVAL_SECS",
            file.report_interval_secs,
            d.report_interval,
        ),
        report_threshold: secs(
            "REPORT_THRESHOLD_SECS",
            file.report_threshold_secs,
            d.report_threshold,
        ),
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim().trim_start_matches("export ").trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}
