use serde::{Deserialize, Serialize};

// ============================================================================
// TMDB Types
// ============================================================================

/// A movie as listed by the catalog's trending and search feeds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Movie {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

/// Paged list envelope used by every TMDB list endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paged<T> {
    #[serde(default)]
    pub page: u32,
    // Plain `default` would make the derive demand `T: Default`
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

/// GET /movie/{id} with videos, credits and recommendations appended
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub credits: Credits,
    #[serde(default)]
    pub videos: Videos,
    #[serde(default)]
    pub recommendations: Option<Paged<Movie>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrewMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Videos {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub site: String,
    #[serde(rename = "type", default)]
    pub video_type: String,
}

impl Movie {
    /// Year portion of the release date, when the catalog has one
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|date| date.split('-').next())
            .and_then(|year| year.parse().ok())
    }
}

impl MovieDetails {
    pub fn id(&self) -> u64 {
        self.movie.id
    }

    pub fn release_year(&self) -> Option<i32> {
        self.movie.release_year()
    }

    /// First `n` billed cast members
    pub fn top_cast(&self, n: usize) -> &[CastMember] {
        let end = n.min(self.credits.cast.len());
        &self.credits.cast[..end]
    }

    /// Directors listed in the crew
    pub fn directors(&self) -> impl Iterator<Item = &CrewMember> {
        self.credits
            .crew
            .iter()
            .filter(|member| member.job.as_deref() == Some("Director"))
    }

    /// First YouTube trailer, if any
    pub fn trailer(&self) -> Option<&Video> {
        self.videos
            .results
            .iter()
            .find(|video| video.site == "YouTube" && video.video_type == "Trailer")
    }

    /// Movies the catalog recommends alongside this one
    pub fn recommended(&self) -> &[Movie] {
        self.recommendations
            .as_ref()
            .map(|page| page.results.as_slice())
            .unwrap_or(&[])
    }
}
