// src/vote.rs
//! Vote casting and the tally.

use chrono::Utc;
use tracing::warn;

use crate::error::AppError;
use crate::guard::Caller;
use crate::models::{OptionData, PollId, PollVote, PollVoteResult, UserId, VoteCounting};
use crate::pipeline::Pipeline;
use crate::poll::resolve_poll_id;
use crate::services::Services;

pub const ALREADY_VOTED: &str = "You already voted in this poll.";
pub const TOTAL_KEY: &str = "total";

/// A vote on its way through the checks.
#[derive(Debug, Clone)]
pub struct Ballot {
    pub poll_id: PollId,
    pub user_id: UserId,
    pub chosen_option: String,
}

pub fn no_such_option(option: &str) -> String {
    format!("There is no option {option} for vote on this poll.")
}

pub async fn create_vote(
    services: &Services,
    caller: &Caller,
    raw_id: &str,
    data: OptionData,
) -> Result<PollVoteResult, AppError> {
    Pipeline::start("create vote", data)
        .step("resolve poll id", |data| async move {
            Ok::<_, AppError>(Ballot {
                poll_id: resolve_poll_id(raw_id)?,
                user_id: caller.logged_user_id(),
                chosen_option: data.value,
            })
        })
        .await
        .step("check option exists", |ballot| async move {
            if !services.exists_option(ballot.poll_id, &ballot.chosen_option).await? {
                return Err(AppError::Conflict(no_such_option(&ballot.chosen_option)));
            }
            Ok(ballot)
        })
        .await
        .step("check duplicate vote", |ballot| async move {
            // no lock between this check and the save below
            if services.poll_already_voted_by_user(ballot.poll_id, ballot.user_id).await? {
                return Err(AppError::Conflict(ALREADY_VOTED.to_string()));
            }
            Ok(ballot)
        })
        .await
        .step("record vote", |ballot| async move {
            let vote = PollVote {
                id: services.ids.next_id(),
                poll_id: ballot.poll_id,
                user_id: ballot.user_id,
                chosen_option: ballot.chosen_option,
                created_at: Utc::now(),
            };
            services.save_vote(vote).await.map_err(AppError::from)
        })
        .await
        .step("tally", |vote| async move {
            Ok(PollVoteResult {
                vote_id: vote.id,
                vote_counting: count_votes(services, vote.poll_id).await,
            })
        })
        .await
        .finish()
}

pub async fn counting_poll_votes(services: &Services, raw_id: &str) -> Result<VoteCounting, AppError> {
    let poll_id = resolve_poll_id(raw_id)?;
    Ok(count_votes(services, poll_id).await)
}

/// Percentage per option of `poll_id`, plus `"total"`.
///
/// The poll's option list decides which keys appear, so options nobody voted
/// for report 0. When the option list cannot be loaded the error message is
/// returned as the only key, mapped to -1.
pub async fn count_votes(services: &Services, poll_id: PollId) -> VoteCounting {
    let options = match services.find_poll_options(poll_id).await {
        Ok(options) => options,
        Err(e) => {
            warn!(poll = %poll_id, error = %e, "Failed to load poll options");
            return VoteCounting::from([(e.to_string(), -1.0)]);
        }
    };

    let mut counts = Vec::with_capacity(options.len());
    for option in &options {
        let count = services.votes_for(poll_id, &option.content).await;
        counts.push((option.content.clone(), count));
    }

    tally(&counts)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Turn per-option counts into percentages rounded to two places.
///
/// Rounding is half away from zero. The last option with votes takes whatever
/// is left of 100 after the others are rounded, so the shares always add up.
/// `None` means the count could not be read and the option reports 0. With no
/// votes at all every option reports 0.
pub fn tally(counts: &[(String, Option<i64>)]) -> VoteCounting {
    let total: i64 = counts.iter().filter_map(|(_, count)| *count).sum();

    let mut result = VoteCounting::new();
    result.insert(TOTAL_KEY.to_string(), total as f64);

    for (option, _) in counts {
        result.insert(option.clone(), 0.0);
    }

    if total == 0 {
        return result;
    }

    let last_voted = counts
        .iter()
        .rposition(|(_, count)| count.unwrap_or(0) > 0);

    let mut assigned = 0.0;
    for (i, (option, count)) in counts.iter().enumerate() {
        let Some(count) = count else { continue };

        let percentage = if Some(i) == last_voted {
            round2(100.0 - assigned)
        } else {
            round2((*count * 100) as f64 / total as f64)
        };

        assigned += percentage;
        result.insert(option.clone(), percentage);
    }

    result
}
