use serde::Serialize;

use crate::models::{Movie, MovieDetails, WishlistItem};

/// Base navigation tabs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Home,
    Movies,
    Tv,
    Wishlist,
}

/// A finished search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub results: Vec<Movie>,
}

/// What is drawn on top of the current tab
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    #[default]
    None,
    Searching(SearchResults),
    /// Movie details, remembering the search they were opened from
    Details {
        movie: Box<MovieDetails>,
        search: Option<SearchResults>,
    },
}

impl Overlay {
    pub fn is_none(&self) -> bool {
        matches!(self, Overlay::None)
    }

    /// The search currently shown or sitting underneath the details
    pub fn search(&self) -> Option<&SearchResults> {
        match self {
            Overlay::Searching(search) => Some(search),
            Overlay::Details { search, .. } => search.as_ref(),
            Overlay::None => None,
        }
    }

    pub fn selected(&self) -> Option<&MovieDetails> {
        match self {
            Overlay::Details { movie, .. } => Some(movie.as_ref()),
            _ => None,
        }
    }

    /// Closing details falls back to the search it came from, closing a
    /// search falls back to the tab.
    pub fn close(self) -> Overlay {
        match self {
            Overlay::Details {
                search: Some(search),
                ..
            } => Overlay::Searching(search),
            _ => Overlay::None,
        }
    }
}

/// Everything the shell renders; rebuilt from the network every session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ShellState {
    pub tab: Tab,
    pub overlay: Overlay,
    pub trending: Vec<Movie>,
    pub wishlist: Vec<WishlistItem>,
    pub recommendations: Vec<String>,
}

impl ShellState {
    pub fn is_in_wishlist(&self, movie_id: u64) -> bool {
        let movie_id = movie_id.to_string();
        self.wishlist.iter().any(|item| item.movie_id == movie_id)
    }

    /// Hero title on the home tab
    pub fn featured(&self) -> Option<&Movie> {
        self.trending.first()
    }

    /// The "critically acclaimed" row: trending in reverse
    pub fn acclaimed(&self) -> impl Iterator<Item = &Movie> {
        self.trending.iter().rev()
    }
}

/// One slot in the live channel's daily programme
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub time: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

/// The 24h live channel shown on the TV tab
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveChannel {
    /// HLS playlist handed to the player as-is
    pub stream_url: String,
    pub poster_url: String,
    pub schedule: Vec<ScheduleEntry>,
}

impl LiveChannel {
    pub fn new(stream_url: String, poster_url: String) -> Self {
        Self {
            stream_url,
            poster_url,
            schedule: todays_schedule(),
        }
    }
}

fn todays_schedule() -> Vec<ScheduleEntry> {
    vec![
        ScheduleEntry {
            time: "18:00",
            title: "Noticiero Llanero",
            description: "Las noticias más importantes de la región.",
        },
        ScheduleEntry {
            time: "19:30",
            title: "Cine Estelar",
            description: "Grandes éxitos de la pantalla grande.",
        },
        ScheduleEntry {
            time: "21:30",
            title: "Deportes en Vivo",
            description: "Resumen de la jornada deportiva.",
        },
    ]
}
