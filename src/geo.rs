//! Great-circle distance and the catalog filters built on it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{Book, BookView, Library, Profile};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Home coordinate of a profile, if both halves are recorded.
    pub fn from_profile(profile: &Profile) -> Option<Self> {
        match (profile.home_latitude, profile.home_longitude) {
            (Some(lat), Some(lng)) => Some(Self::new(lat, lng)),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Haversine distance in kilometers.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

fn matches_query(query: &str, fields: &[&str]) -> bool {
    let needle = query.trim().to_lowercase();
    needle.is_empty() || fields.iter().any(|f| f.to_lowercase().contains(&needle))
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibrarySort {
    #[default]
    Name,
    Distance,
}

#[derive(Debug, Clone, Serialize)]
pub struct LibraryListing {
    #[serde(flatten)]
    pub library: Library,
    pub book_count: i64,
    /// Kilometers from the reference point, `None` without one.
    pub distance: Option<f64>,
}

/// Filters libraries by name/address, attaches distances and sorts them.
///
/// Distance ordering only applies between two rows that both carry a distance;
/// everything else, including a missing origin, falls back to name order.
pub fn rank_libraries(
    libraries: Vec<(Library, i64)>,
    query: &str,
    origin: Option<Coordinate>,
    sort: LibrarySort,
) -> Vec<LibraryListing> {
    let mut listings: Vec<LibraryListing> = libraries
        .into_iter()
        .filter(|(lib, _)| matches_query(query, &[&lib.name, &lib.address]))
        .map(|(library, book_count)| {
            let distance = origin.map(|o| {
                distance_km(o, Coordinate::new(library.latitude, library.longitude))
            });
            LibraryListing {
                library,
                book_count,
                distance,
            }
        })
        .collect();

    listings.sort_by(|a, b| {
        if sort == LibrarySort::Distance {
            if let (Some(da), Some(db)) = (a.distance, b.distance) {
                return da
                    .partial_cmp(&db)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| compare_names(&a.library.name, &b.library.name));
            }
        }
        compare_names(&a.library.name, &b.library.name)
    });

    listings
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[default]
    All,
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFilter {
    #[serde(default)]
    pub search: String,
    pub category: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub availability: Availability,
}

impl BookFilter {
    fn exact(wanted: &Option<String>, value: &str) -> bool {
        match wanted.as_deref() {
            None | Some("") | Some("all") => true,
            Some(w) => w == value,
        }
    }

    pub fn matches(&self, book: &Book) -> bool {
        let availability = match self.availability {
            Availability::All => true,
            Availability::Available => book.available > 0,
            Availability::Unavailable => book.available == 0,
        };
        matches_query(&self.search, &[&book.title, &book.author])
            && Self::exact(&self.category, &book.category)
            && Self::exact(&self.language, &book.language)
            && availability
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LibraryShelf {
    pub library_name: String,
    pub books: Vec<BookView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookCatalog {
    pub total: usize,
    /// Distinct categories across the unfiltered input, sorted.
    pub categories: Vec<String>,
    pub languages: Vec<String>,
    pub books: Vec<BookView>,
    pub by_library: Vec<LibraryShelf>,
}

pub fn build_catalog(books: Vec<BookView>, filter: &BookFilter) -> BookCatalog {
    let mut categories: Vec<String> = books.iter().map(|b| b.book.category.clone()).collect();
    categories.sort();
    categories.dedup();
    let mut languages: Vec<String> = books.iter().map(|b| b.book.language.clone()).collect();
    languages.sort();
    languages.dedup();

    let books: Vec<BookView> = books.into_iter().filter(|b| filter.matches(&b.book)).collect();

    let mut by_library: Vec<LibraryShelf> = Vec::new();
    for book in &books {
        match by_library.iter_mut().find(|s| s.library_name == book.library_name) {
            Some(shelf) => shelf.books.push(book.clone()),
            None => by_library.push(LibraryShelf {
                library_name: book.library_name.clone(),
                books: vec![book.clone()],
            }),
        }
    }

    BookCatalog {
        total: books.len(),
        categories,
        languages,
        books,
        by_library,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentLocation {
    pub id: String,
    pub full_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub home_address: String,
    pub home_latitude: f64,
    pub home_longitude: f64,
    pub distance: Option<f64>,
}

/// Students with a full home location, matching the query on name/email/address.
pub fn locate_students(
    students: Vec<Profile>,
    query: &str,
    origin: Option<Coordinate>,
) -> Vec<StudentLocation> {
    let mut located: Vec<StudentLocation> = students
        .into_iter()
        .filter_map(|p| {
            let home = Coordinate::from_profile(&p)?;
            let address = p.home_address.clone()?;
            let name = p.full_name.clone().unwrap_or_default();
            if !matches_query(query, &[&name, &p.email, &address]) {
                return None;
            }
            Some(StudentLocation {
                distance: origin.map(|o| distance_km(o, home)),
                id: p.id,
                full_name: p.full_name,
                email: p.email,
                phone: p.phone,
                home_address: address,
                home_latitude: home.latitude,
                home_longitude: home.longitude,
            })
        })
        .collect();

    located.sort_by(|a, b| {
        compare_names(
            a.full_name.as_deref().unwrap_or(&a.email),
            b.full_name.as_deref().unwrap_or(&b.email),
        )
    });
    located
}
