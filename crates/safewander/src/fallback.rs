//! Embedded sample data.
//!
//! Shown next to live data on the explore page, and instead of it when the
//! backend cannot be reached and nothing is cached.

use crate::model::{
    Achievement, Coordinates, Place, PlaceCategory, Profile, ProfileReview, Provenance, Review,
    User, UserStats,
};

/// Ids used by the sample places. Remote ids may overlap them.
pub const SAMPLE_PLACE_IDS: [i64; 4] = [1, 2, 3, 4];

/// Id of the place with a full sample detail page.
pub const SAMPLE_DETAIL_ID: i64 = 1;

#[allow(clippy::too_many_arguments)]
fn sample_place(
    id: i64,
    name: &str,
    category: &str,
    location: &str,
    rating: f64,
    safety_score: f64,
    image: &str,
    tags: &[&str],
    last_updated: &str,
    coordinates: Coordinates,
) -> Place {
    Place {
        id,
        name: name.to_string(),
        category: PlaceCategory::parse(category),
        category_label: category.to_string(),
        location: location.to_string(),
        rating,
        safety_score,
        image: image.to_string(),
        tags: tags.iter().map(ToString::to_string).collect(),
        last_updated: last_updated.to_string(),
        coordinates,
        description: None,
        hours: None,
        total_reviews: None,
        author: None,
        review: None,
        provenance: Provenance::Fallback,
    }
}

/// The four Tokyo places of the explore page.
#[must_use]
pub fn sample_places() -> Vec<Place> {
    vec![
        sample_place(
            1,
            "Blue Bottle Coffee",
            "Cafe",
            "Shibuya, Tokyo",
            4.8,
            9.2,
            "https://images.pexels.com/photos/302899/pexels-photo-302899.jpeg?auto=compress&cs=tinysrgb&w=400",
            &["WiFi", "Solo-friendly", "Well-lit"],
            "2 hours ago",
            Coordinates::new(35.6762, 139.6503),
        ),
        sample_place(
            2,
            "Capsule Hotel Zen",
            "Hotel",
            "Shinjuku, Tokyo",
            4.6,
            8.9,
            "https://images.pexels.com/photos/271624/pexels-photo-271624.jpeg?auto=compress&cs=tinysrgb&w=400",
            &["Female-only floors", "24/7 security", "Central location"],
            "5 hours ago",
            Coordinates::new(35.6896, 139.6917),
        ),
        sample_place(
            3,
            "Senso-ji Temple",
            "Attraction",
            "Asakusa, Tokyo",
            4.9,
            9.5,
            "https://images.pexels.com/photos/161401/fushimi-inari-taisha-shrine-kyoto-japan-temple-161401.jpeg?auto=compress&cs=tinysrgb&w=400",
            &["Well-patrolled", "Tourist-friendly", "Day visits recommended"],
            "1 day ago",
            Coordinates::new(35.7148, 139.7967),
        ),
        sample_place(
            4,
            "Starbucks Reserve Roastery",
            "Cafe",
            "Nakameguro, Tokyo",
            4.7,
            9.0,
            "https://images.pexels.com/photos/1307698/pexels-photo-1307698.jpeg?auto=compress&cs=tinysrgb&w=400",
            &["Spacious", "Good for meetings", "Safe area"],
            "3 hours ago",
            Coordinates::new(35.6434, 139.6982),
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn sample_review(
    id: i64,
    author: &str,
    rating: f64,
    safety_score: f64,
    date: &str,
    text: &str,
    helpful: u32,
    tags: &[&str],
) -> Review {
    Review {
        id,
        place_id: Some(SAMPLE_DETAIL_ID),
        author: author.to_string(),
        rating,
        safety_score,
        review: text.to_string(),
        tags: tags.iter().map(ToString::to_string).collect(),
        date: date.to_string(),
        helpful,
        visit_time: None,
        would_recommend: true,
        images: Vec::new(),
    }
}

/// The Blue Bottle detail page: the place and its three reviews.
#[must_use]
pub fn sample_place_details() -> (Place, Vec<Review>) {
    let mut place = sample_place(
        SAMPLE_DETAIL_ID,
        "Blue Bottle Coffee",
        "Cafe",
        "Shibuya, Tokyo, Japan",
        4.8,
        9.2,
        "https://images.pexels.com/photos/302899/pexels-photo-302899.jpeg?auto=compress&cs=tinysrgb&w=800",
        &["WiFi Available", "Solo-friendly", "Well-lit", "English-speaking staff"],
        "2 hours ago",
        Coordinates::new(35.6762, 139.6503),
    );
    place.description = Some(
        "A popular coffee chain known for its high-quality beans and minimalist aesthetic. \
         This Shibuya location is particularly welcoming to solo travelers."
            .to_string(),
    );
    place.hours = Some("Mon-Sun: 7:00 AM - 10:00 PM".to_string());
    place.total_reviews = Some(127);

    let reviews = vec![
        sample_review(
            1,
            "Sarah M.",
            5.0,
            9.5,
            "2024-01-15",
            "Perfect spot for solo work sessions. The staff is incredibly friendly and the \
             atmosphere is very welcoming. I felt completely safe here even late in the evening. \
             Great WiFi and plenty of power outlets.",
            12,
            &["Solo-friendly", "Good WiFi", "Safe evening"],
        ),
        sample_review(
            2,
            "Emma L.",
            4.0,
            8.8,
            "2024-01-10",
            "Nice coffee and good location. The place gets quite busy during lunch hours but \
             the staff manages the crowd well. Felt safe throughout my visit.",
            8,
            &["Busy lunch", "Good service"],
        ),
        sample_review(
            3,
            "Lisa K.",
            5.0,
            9.0,
            "2024-01-05",
            "Excellent coffee quality and the baristas are very knowledgeable. The seating area \
             is well-designed for both solo visitors and groups. Highly recommend!",
            15,
            &["Quality coffee", "Knowledgeable staff"],
        ),
    ];

    (place, reviews)
}

/// The "latest reviews" strip of the home page, one place per review.
#[must_use]
pub fn sample_recent_reviews() -> Vec<Place> {
    let entries = [
        (
            1,
            "Blue Bottle Coffee",
            "Cafe",
            4.8,
            "Perfect spot for solo work sessions. Great WiFi, friendly staff, and felt very safe.",
            "Sarah M.",
        ),
        (
            2,
            "Hostel World Shibuya",
            "Accommodation",
            4.6,
            "Female-only dorms available. Great security and helpful staff for solo travelers.",
            "Emma L.",
        ),
        (
            3,
            "Senso-ji Temple",
            "Attraction",
            4.9,
            "Beautiful temple, well-lit paths, and plenty of other tourists around. Felt very safe.",
            "Lisa K.",
        ),
    ];

    entries
        .into_iter()
        .enumerate()
        .map(|(index, (id, name, category, rating, text, author))| {
            let mut place = sample_place(
                id,
                name,
                category,
                "Tokyo, Japan",
                rating,
                0.0,
                crate::reshape::DEFAULT_IMAGE,
                &[],
                crate::reshape::UNKNOWN_DATE,
                crate::reshape::synthetic_coordinates(index),
            );
            place.author = Some(author.to_string());
            place.review = Some(text.to_string());
            place
        })
        .collect()
}

/// The profile page of the demo traveler.
#[must_use]
pub fn sample_profile() -> Profile {
    Profile {
        user: User {
            id: 1,
            name: "Demo Traveler".to_string(),
            email: "traveler@example.com".to_string(),
            avatar: None,
            join_date: "2023-06-01".to_string(),
            location: Some("Tokyo, Japan".to_string()),
            bio: None,
            stats: UserStats {
                reviews_count: 23,
                places_visited: 45,
                helpful_votes: 156,
                safety_contributions: 89,
            },
        },
        achievements: vec![
            Achievement {
                title: "Top Reviewer",
                description: "20+ reviews submitted",
            },
            Achievement {
                title: "Safety Expert",
                description: "High-quality safety ratings",
            },
            Achievement {
                title: "Explorer",
                description: "10+ cities reviewed",
            },
            Achievement {
                title: "Community Helper",
                description: "100+ helpful votes",
            },
        ],
        recent_reviews: vec![
            profile_review(1, "Blue Bottle Coffee", 4.8, 9.2, "2024-01-15", 12),
            profile_review(2, "Hostel World Shibuya", 4.6, 8.9, "2024-01-10", 8),
            profile_review(3, "Senso-ji Temple", 4.9, 9.5, "2024-01-05", 15),
        ],
    }
}

fn profile_review(
    id: i64,
    place: &str,
    rating: f64,
    safety_score: f64,
    date: &str,
    helpful: u32,
) -> ProfileReview {
    ProfileReview {
        id,
        place: place.to_string(),
        location: "Tokyo, Japan".to_string(),
        rating,
        safety_score,
        date: date.to_string(),
        helpful,
    }
}
