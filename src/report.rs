use crate::models::ListingRecord;
use std::cmp::Ordering;
use std::fmt;

const PREVIEW_CHARS: usize = 100;

/// Filter by distance and optionally sort nearest first. Records without a
/// known distance sort last and are dropped when a limit is given.
pub fn summarize(
    records: &[ListingRecord],
    max_distance_km: Option<f64>,
    sort_by_distance: bool,
) -> Vec<&ListingRecord> {
    let mut selected: Vec<&ListingRecord> = records
        .iter()
        .filter(|record| match (max_distance_km, record.distance_from_office_km) {
            (Some(limit), Some(distance)) => distance <= limit,
            (Some(_), None) => false,
            (None, _) => true,
        })
        .collect();

    if sort_by_distance {
        selected.sort_by(|a, b| {
            match (a.distance_from_office_km, b.distance_from_office_km) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }

    selected
}

/// Console overview of a set of listings
pub struct Report<'a>(pub &'a [&'a ListingRecord]);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let records = self.0;
        if records.is_empty() {
            return writeln!(f, "No results to display.");
        }

        writeln!(f, "🏠 Found {} properties", records.len())?;
        writeln!(f, "{}", "=".repeat(80))?;

        for (i, record) in records.iter().enumerate() {
            writeln!(
                f,
                "{}. 📍 {}",
                i + 1,
                record.location.as_deref().unwrap_or("Unknown location")
            )?;
            if let Some(city) = &record.city {
                writeln!(f, "   City: {}", city)?;
            }
            if let Some(rent) = record.rent {
                writeln!(f, "   Rent: ₹{}", rent)?;
            }
            if let Some(bhk) = &record.bhk {
                writeln!(f, "   Type: {}", bhk)?;
            }
            if let Some(distance) = record.distance_from_office_km {
                writeln!(f, "   Distance: {} km from office", distance)?;
            }
            if let Some(duration) = &record.driving_duration {
                writeln!(f, "   Drive time: {}", duration)?;
            }
            if let Some(details) = &record.additional_details {
                writeln!(f, "   Details: {}", details)?;
            }
            writeln!(f, "   Posted: {}", record.date.format("%Y-%m-%d %H:%M"))?;
            if !record.page_url.is_empty() {
                writeln!(f, "   Link: {}", record.page_url)?;
            }
            let preview: String = record.original_message.chars().take(PREVIEW_CHARS).collect();
            writeln!(f, "   Message: {}", preview)?;
            writeln!(f, "{}", "-".repeat(40))?;
        }
        Ok(())
    }
}

/// Human-readable listing overview
pub fn render(records: &[&ListingRecord]) -> String {
    Report(records).to_string()
}
