use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use sqlx::sqlite::SqlitePool;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::api::slack::SlackClient;
use crate::db;
use crate::error::AppError;
use crate::models::event::MessageEvent;
use crate::models::notification::KarmaNotification;
use crate::models::transaction::{KarmaTransaction, StorableTransaction};
use crate::models::user::UserProfile;

lazy_static! {
    // Matches a mention token followed by a run of two or more identical
    // karma symbols, e.g. "<@U12345678> ++" or "<@gratitude-dev> ---".
    static ref KARMA_MENTION_RE: Regex = Regex::new(r"(<@[^>]+>) (\+{2,}|-{2,})").unwrap();
}

/// Absolute karma budget per sender over a rolling 14-day window,
/// tracked independently for given and taken.
const LIMIT: i64 = 50;

const RATE_WINDOW_DAYS: i64 = 14;

/// Run the karma pipeline for one channel message.
///
/// Parses mention/symbol runs into transactions, flags self-karma, checks
/// the sender's rolling budgets, resolves the mentioned users against the
/// directory, persists what the budgets allow, and posts the outcome back
/// to the channel. A message without karma mentions is a silent no-op.
pub async fn process_message(
    pool: &SqlitePool,
    slack: &SlackClient,
    event: &MessageEvent,
) -> Result<(), AppError> {
    let now = Utc::now();
    let from_user = format!("<@{}>", event.user);

    let transactions = parse_transactions(&event.text, &from_user, now);
    if transactions.is_empty() {
        return Ok(());
    }
    debug!(
        "found {} karma mention(s) from {} in {}",
        transactions.len(),
        from_user,
        event.channel
    );

    let given_karmas_to_himself = has_given_karma_to_himself(&transactions);
    let taken_karmas_from_himself = has_taken_karma_from_himself(&transactions);

    let valid_transactions = transactions_not_to_himself(transactions);

    let total_to_give = total_karma_to_give(&valid_transactions);
    let total_to_take = total_karma_to_take(&valid_transactions);

    let since = now - Duration::days(RATE_WINDOW_DAYS);
    let (given_last_2_weeks, taken_last_2_weeks) = tokio::try_join!(
        db::transaction::get_given_karma_since(pool, &from_user, since),
        db::transaction::get_taken_karma_since(pool, &from_user, since),
    )?;

    let can_give_karma = given_last_2_weeks + total_to_give <= LIMIT;
    let can_take_karma = taken_last_2_weeks.abs() + total_to_take <= LIMIT;

    let user_ids = resolve_users(pool, slack, &valid_transactions).await?;

    let storable: Vec<StorableTransaction> =
        select_storable(valid_transactions, can_give_karma, can_take_karma)
            .into_iter()
            .map(|transaction| {
                let from_user_id = user_ids.get(provider_id(&transaction.from_user)).cloned();
                let to_user_id = user_ids.get(provider_id(&transaction.to_user)).cloned();
                StorableTransaction {
                    transaction,
                    from_user_id,
                    to_user_id,
                }
            })
            .collect();

    let affected_users = db::transaction::store_karma(pool, &storable).await?;

    slack
        .send_karma_notifications(&KarmaNotification {
            channel: event.channel.clone(),
            from_user,
            can_give_karma,
            can_take_karma,
            given_karmas_to_himself,
            taken_karmas_from_himself,
            affected_users,
        })
        .await?;

    Ok(())
}

/// Parse every karma mention in `text` into a transaction.
///
/// The amount is the symbol run length minus one, negative for `-` runs.
/// The mention token is kept verbatim as the recipient.
pub fn parse_transactions(
    text: &str,
    from_user: &str,
    now: DateTime<Utc>,
) -> Vec<KarmaTransaction> {
    KARMA_MENTION_RE
        .captures_iter(text)
        .map(|capture| {
            let to_user = capture[1].to_string();
            let run = &capture[2];
            let amount = if run.starts_with('+') {
                run.len() as i64 - 1
            } else {
                -(run.len() as i64 - 1)
            };
            KarmaTransaction {
                message: text.to_string(),
                from_user: from_user.to_string(),
                to_user,
                amount,
                timestamp: now,
            }
        })
        .collect()
}

/// True if any transaction sends positive karma to the sender himself
pub fn has_given_karma_to_himself(transactions: &[KarmaTransaction]) -> bool {
    transactions
        .iter()
        .any(|transaction| transaction.from_user == transaction.to_user && transaction.amount > 0)
}

/// True if any transaction takes karma from the sender himself
pub fn has_taken_karma_from_himself(transactions: &[KarmaTransaction]) -> bool {
    transactions
        .iter()
        .any(|transaction| transaction.from_user == transaction.to_user && transaction.amount < 0)
}

/// Keep only transactions whose recipient differs from the sender
pub fn transactions_not_to_himself(transactions: Vec<KarmaTransaction>) -> Vec<KarmaTransaction> {
    transactions
        .into_iter()
        .filter(|transaction| transaction.from_user != transaction.to_user)
        .collect()
}

/// Total positive karma in the batch
pub fn total_karma_to_give(transactions: &[KarmaTransaction]) -> i64 {
    transactions
        .iter()
        .filter(|transaction| transaction.amount > 0)
        .map(|transaction| transaction.amount)
        .sum()
}

/// Total magnitude of negative karma in the batch
pub fn total_karma_to_take(transactions: &[KarmaTransaction]) -> i64 {
    transactions
        .iter()
        .filter(|transaction| transaction.amount < 0)
        .map(|transaction| transaction.amount.abs())
        .sum()
}

/// Drop the direction(s) whose budget is exhausted, preserving batch order
pub fn select_storable(
    transactions: Vec<KarmaTransaction>,
    can_give_karma: bool,
    can_take_karma: bool,
) -> Vec<KarmaTransaction> {
    transactions
        .into_iter()
        .filter(|transaction| {
            (transaction.amount > 0 && can_give_karma)
                || (transaction.amount < 0 && can_take_karma)
        })
        .collect()
}

/// The provider id inside a mention token: `<@U123>` -> `U123`
pub fn provider_id(mention: &str) -> &str {
    mention
        .trim_start_matches("<@")
        .trim_end_matches('>')
        .trim()
}

/// Resolve every distinct user mentioned in the valid set against the
/// directory, upserting a record for each one the platform knows.
///
/// Returns provider id -> directory id. A failed lookup only logs a
/// warning: the affected transactions are stored with unresolved keys
/// rather than blocking the batch. Upsert failures do propagate.
async fn resolve_users(
    pool: &SqlitePool,
    slack: &SlackClient,
    transactions: &[KarmaTransaction],
) -> Result<HashMap<String, String>, AppError> {
    let from_ids = transactions
        .iter()
        .map(|transaction| provider_id(&transaction.from_user));
    let to_ids = transactions
        .iter()
        .map(|transaction| provider_id(&transaction.to_user));

    let mut distinct_ids: Vec<&str> = Vec::new();
    for id in from_ids.chain(to_ids) {
        if !distinct_ids.contains(&id) {
            distinct_ids.push(id);
        }
    }

    let mut user_ids = HashMap::new();
    for id in distinct_ids {
        match slack.user_info(id).await {
            Ok(Some(info)) => {
                let profile = UserProfile {
                    username: info.name.clone(),
                    display_name: info.profile.display_name.clone(),
                    real_name: info
                        .profile
                        .real_name
                        .clone()
                        .filter(|name| !name.is_empty()),
                    avatar_url: info.profile.image_original.clone(),
                    timezone: info.tz.clone(),
                    is_bot: info.is_bot,
                    is_active: true,
                };
                let record =
                    db::user::create_user_if_not_exists(pool, "slack", &info.id, &profile).await?;
                user_ids.insert(id.to_string(), record.id);
            }
            Ok(None) => {
                warn!("could not resolve user {} against the directory", id);
            }
            Err(e) => {
                warn!("user lookup for {} failed: {}", id, e);
            }
        }
    }

    Ok(user_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transaction(from_user: &str, to_user: &str, amount: i64) -> KarmaTransaction {
        KarmaTransaction {
            message: String::new(),
            from_user: from_user.to_string(),
            to_user: to_user.to_string(),
            amount,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn parses_amount_as_run_length_minus_one() {
        let parsed = parse_transactions("<@U11111111> +++", "<@U22222222>", Utc::now());
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].to_user, "<@U11111111>");
        assert_eq!(parsed[0].amount, 2);

        let parsed = parse_transactions("<@U11111111> -----", "<@U22222222>", Utc::now());
        assert_eq!(parsed[0].amount, -4);
    }

    #[test]
    fn parses_minimal_runs() {
        let parsed = parse_transactions("<@U11111111> ++", "<@U22222222>", Utc::now());
        assert_eq!(parsed[0].amount, 1);

        let parsed = parse_transactions("<@U11111111> --", "<@U22222222>", Utc::now());
        assert_eq!(parsed[0].amount, -1);
    }

    #[test]
    fn ignores_single_symbols_and_missing_space() {
        assert!(parse_transactions("<@U11111111> +", "<@U2>", Utc::now()).is_empty());
        assert!(parse_transactions("<@U11111111>++", "<@U2>", Utc::now()).is_empty());
        assert!(parse_transactions("no mentions here ++", "<@U2>", Utc::now()).is_empty());
    }

    #[test]
    fn accepts_any_mention_token() {
        let parsed = parse_transactions("<@gratitude-dev> +++", "<@U11111111>", Utc::now());
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].to_user, "<@gratitude-dev>");
    }

    #[test]
    fn parses_multiple_mentions_in_text_order() {
        let now = Utc::now();
        let parsed = parse_transactions("<@U1ABCDEFG> +++ and <@U2ABCDEFG> --", "<@U3>", now);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].to_user, "<@U1ABCDEFG>");
        assert_eq!(parsed[0].amount, 2);
        assert_eq!(parsed[1].to_user, "<@U2ABCDEFG>");
        assert_eq!(parsed[1].amount, -1);
        // the whole batch shares one message and timestamp
        assert_eq!(parsed[0].message, parsed[1].message);
        assert_eq!(parsed[0].timestamp, now);
    }

    #[test]
    fn flags_self_karma_by_direction() {
        let given = vec![transaction("<@U1>", "<@U1>", 2)];
        assert!(has_given_karma_to_himself(&given));
        assert!(!has_taken_karma_from_himself(&given));

        let taken = vec![transaction("<@U1>", "<@U1>", -2)];
        assert!(!has_given_karma_to_himself(&taken));
        assert!(has_taken_karma_from_himself(&taken));
    }

    #[test]
    fn filters_self_transactions() {
        let batch = vec![
            transaction("<@U1>", "<@U1>", 2),
            transaction("<@U1>", "<@U2>", 3),
            transaction("<@U1>", "<@U1>", -2),
        ];
        let valid = transactions_not_to_himself(batch);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].to_user, "<@U2>");
    }

    #[test]
    fn totals_split_by_direction() {
        let batch = vec![
            transaction("<@U1>", "<@U2>", 3),
            transaction("<@U1>", "<@U3>", -2),
            transaction("<@U1>", "<@U4>", 1),
        ];
        assert_eq!(total_karma_to_give(&batch), 4);
        assert_eq!(total_karma_to_take(&batch), 2);
    }

    #[test]
    fn select_storable_keeps_batch_order() {
        let batch = vec![
            transaction("<@U1>", "<@U2>", -2),
            transaction("<@U1>", "<@U3>", 3),
            transaction("<@U1>", "<@U4>", -1),
        ];
        let stored = select_storable(batch, true, true);
        let amounts: Vec<i64> = stored.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![-2, 3, -1]);
    }

    #[test]
    fn select_storable_drops_exhausted_directions() {
        let batch = vec![
            transaction("<@U1>", "<@U2>", 2),
            transaction("<@U1>", "<@U3>", -2),
        ];
        let stored = select_storable(batch.clone(), false, true);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].amount, -2);

        let stored = select_storable(batch.clone(), true, false);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].amount, 2);

        assert!(select_storable(batch, false, false).is_empty());
    }

    #[test]
    fn provider_id_strips_mention_syntax() {
        assert_eq!(provider_id("<@U12345678>"), "U12345678");
        assert_eq!(provider_id("<@gratitude-dev>"), "gratitude-dev");
    }
}
