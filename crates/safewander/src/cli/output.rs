//! Plain-text rendering for the terminal.

use std::fmt::Write as _;

use crate::cache::CacheStats;
use crate::model::{Place, Profile, Provenance, SafetyLevel};
use crate::service::{PlaceDetails, ServiceStatus};

/// A one-line note explaining where degraded data came from.
#[must_use]
pub fn provenance_note(provenance: Provenance, degraded: bool) -> Option<&'static str> {
    if !degraded {
        return None;
    }
    Some(match provenance {
        Provenance::Cached => "Backend unreachable; showing cached data.",
        Provenance::Fallback | Provenance::Remote => {
            "Backend unreachable; showing sample data."
        }
    })
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Places as an aligned table.
#[must_use]
pub fn places_table(places: &[Place]) -> String {
    if places.is_empty() {
        return "No places found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<28} {:<12} {:<22} {:>6} {:>6}  {}",
        "ID", "NAME", "CATEGORY", "LOCATION", "RATING", "SAFETY", "SOURCE"
    );
    for place in places {
        let _ = writeln!(
            out,
            "{:>5}  {:<28} {:<12} {:<22} {:>6.1} {:>6.1}  {}",
            place.id,
            truncate(&place.name, 28),
            place.category.id(),
            truncate(&place.location, 22),
            place.rating,
            place.safety_score,
            place.provenance
        );
    }
    out
}

/// The newest reviews, one block each.
#[must_use]
pub fn latest_list(places: &[Place]) -> String {
    if places.is_empty() {
        return "No reviews yet.\n".to_string();
    }

    let mut out = String::new();
    for place in places {
        let _ = writeln!(
            out,
            "{} ({}) - {:.1}/5",
            place.name,
            place.category.display_name(),
            place.rating
        );
        if let Some(review) = &place.review {
            let _ = writeln!(out, "  \"{review}\"");
        }
        let _ = writeln!(
            out,
            "  by {} on {}",
            place.author.as_deref().unwrap_or("Anonymous"),
            place.last_updated
        );
    }
    out
}

/// A place page.
#[must_use]
pub fn details_text(details: &PlaceDetails) -> String {
    let place = &details.place;
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", place.category.icon(), place.name);
    let _ = writeln!(out, "{}", place.location);
    let _ = writeln!(
        out,
        "Rating {:.1}/5  Safety {:.1}/10 ({})",
        place.rating,
        place.safety_score,
        SafetyLevel::from_score(place.safety_score)
    );
    if let Some(description) = &place.description {
        let _ = writeln!(out, "\n{description}");
    }
    if let Some(hours) = &place.hours {
        let _ = writeln!(out, "Hours: {hours}");
    }
    if !place.tags.is_empty() {
        let _ = writeln!(out, "Tags: {}", place.tags.join(", "));
    }

    let total = place.total_reviews.map_or(details.summary.count, |t| t as usize);
    let _ = writeln!(out, "\nReviews ({total})");
    if let (Some(rating), Some(safety)) = (
        details.summary.average_rating,
        details.summary.average_safety,
    ) {
        let _ = writeln!(out, "Average rating {rating:.1}, average safety {safety:.1}");
    }
    for review in &details.reviews {
        let _ = writeln!(
            out,
            "\n- {} ({})  {:.0}/5  safety {:.1}",
            review.author, review.date, review.rating, review.safety_score
        );
        let _ = writeln!(out, "  {}", review.review);
        if !review.tags.is_empty() {
            let _ = writeln!(out, "  [{}]", review.tags.join("] ["));
        }
        if review.helpful > 0 {
            let _ = writeln!(out, "  {} found this helpful", review.helpful);
        }
    }
    out
}

/// A profile page.
#[must_use]
pub fn profile_text(profile: &Profile) -> String {
    let user = &profile.user;
    let stats = &user.stats;
    let mut out = String::new();
    let _ = writeln!(out, "{} <{}>", user.name, user.email);
    if let Some(location) = &user.location {
        let _ = writeln!(out, "{location}");
    }
    let _ = writeln!(out, "Member since {}", user.join_date);
    let _ = writeln!(
        out,
        "\n{} reviews  {} places  {} helpful votes  {} safety contributions",
        stats.reviews_count, stats.places_visited, stats.helpful_votes, stats.safety_contributions
    );
    let _ = writeln!(out, "\nAchievements");
    for achievement in &profile.achievements {
        let _ = writeln!(out, "  {}: {}", achievement.title, achievement.description);
    }
    let _ = writeln!(out, "\nRecent reviews");
    for review in &profile.recent_reviews {
        let _ = writeln!(
            out,
            "  {} ({}) {:.1}/5 safety {:.1} on {}",
            review.place, review.location, review.rating, review.safety_score, review.date
        );
    }
    out
}

/// Cache statistics.
#[must_use]
pub fn cache_stats_text(stats: &CacheStats) -> String {
    let refreshed = stats
        .last_refreshed
        .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string());
    format!(
        "Cached reviews:  {}\nQueued reviews:  {}\nLast refreshed:  {}\nDatabase size:   {} bytes\n",
        stats.cached_reviews, stats.pending_submissions, refreshed, stats.db_size_bytes
    )
}

/// Service status.
#[must_use]
pub fn status_text(status: &ServiceStatus, backend_url: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "safewander status");
    let _ = writeln!(out, "-----------------");
    if status.backend_reachable {
        let _ = writeln!(
            out,
            "Backend:         reachable at {} ({} reviews)",
            backend_url,
            status.backend_reviews.unwrap_or(0)
        );
    } else {
        let _ = writeln!(
            out,
            "Backend:         unreachable at {} ({})",
            backend_url,
            status.backend_error.as_deref().unwrap_or("unknown error")
        );
    }
    match &status.cache {
        Some(stats) => {
            out.push_str(&cache_stats_text(stats));
            if status.cache_stale == Some(true) {
                let _ = writeln!(out, "Cache is stale.");
            }
        }
        None => {
            let _ = writeln!(out, "Cache:           disabled");
        }
    }
    out
}
