use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::api::v1::{PropertyParamsV1, PropertyRecordV1};
use crate::{ApiContext, Client, RoostModelError, RoostModelResult, SortDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Vacant,
    Occupied,
    OffMarket,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Vacant => "vacant",
            PropertyStatus::Occupied => "occupied",
            PropertyStatus::OffMarket => "off_market",
        }
    }
}

impl Display for PropertyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyStatus {
    type Err = RoostModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vacant" => Ok(PropertyStatus::Vacant),
            "occupied" => Ok(PropertyStatus::Occupied),
            "off_market" => Ok(PropertyStatus::OffMarket),
            other => Err(RoostModelError::InvalidRecord {
                kind: "property",
                reason: format!("unknown status {:?}", other),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: i64,
    pub address: String,
    pub city: String,
    pub rent_cents: i64,
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub status: PropertyStatus,
    pub manager_id: i64,
    pub listed_at: DateTime<Utc>,
    pub description: Option<String>,
}

impl Property {
    pub fn rent_display(&self) -> String {
        format!("${}.{:02}", self.rent_cents / 100, self.rent_cents % 100)
    }

    pub async fn all(client: &Client, ctx: &ApiContext) -> RoostModelResult<Vec<Property>> {
        let records: Vec<PropertyRecordV1> = client.get(ctx, "/api/v1/properties").await?;
        records.into_iter().map(Property::try_from).collect()
    }

    pub async fn get(
        client: &Client,
        ctx: &ApiContext,
        id: i64,
    ) -> RoostModelResult<Option<Property>> {
        let record: Option<PropertyRecordV1> = client
            .get_opt(ctx, &format!("/api/v1/properties/{}", id))
            .await?;
        record.map(Property::try_from).transpose()
    }

    pub async fn create(
        client: &Client,
        ctx: &ApiContext,
        params: &PropertyParamsV1,
    ) -> RoostModelResult<Property> {
        let record: PropertyRecordV1 = client
            .post(Some(ctx), "/api/v1/properties", params)
            .await?;
        Property::try_from(record)
    }

    pub async fn update(
        client: &Client,
        ctx: &ApiContext,
        id: i64,
        params: &PropertyParamsV1,
    ) -> RoostModelResult<Property> {
        let record: PropertyRecordV1 = client
            .post(Some(ctx), &format!("/api/v1/properties/{}", id), params)
            .await?;
        Property::try_from(record)
    }

    pub async fn delete(client: &Client, ctx: &ApiContext, id: i64) -> RoostModelResult<()> {
        client
            .post_unit(
                ctx,
                &format!("/api/v1/properties/{}/delete", id),
                &serde_json::json!({}),
            )
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertySort {
    Rent,
    Bedrooms,
    City,
    ListedAt,
}

impl Default for PropertySort {
    fn default() -> Self {
        Self::ListedAt
    }
}

/// Multi-field filter and sort for the property listing page.
///
/// The platform API returns the full visible listing for the caller's role;
/// narrowing, ordering and paging happen here, on the request-local
/// snapshot.
#[derive(Debug, Clone, Default)]
pub struct PropertyQuery {
    pub city: Option<String>,
    pub min_rent_cents: Option<i64>,
    pub max_rent_cents: Option<i64>,
    pub min_bedrooms: Option<u8>,
    pub status: Option<PropertyStatus>,
    pub sort: PropertySort,
    pub direction: SortDirection,
}

impl PropertyQuery {
    fn matches(&self, property: &Property) -> bool {
        if let Some(city) = &self.city {
            if !property.city.to_lowercase().contains(&city.to_lowercase()) {
                return false;
            }
        }
        if let Some(min) = self.min_rent_cents {
            if property.rent_cents < min {
                return false;
            }
        }
        if let Some(max) = self.max_rent_cents {
            if property.rent_cents > max {
                return false;
            }
        }
        if let Some(bedrooms) = self.min_bedrooms {
            if property.bedrooms < bedrooms {
                return false;
            }
        }
        if let Some(status) = self.status {
            if property.status != status {
                return false;
            }
        }
        true
    }

    fn compare(&self, a: &Property, b: &Property) -> Ordering {
        let ord = match self.sort {
            PropertySort::Rent => a.rent_cents.cmp(&b.rent_cents),
            PropertySort::Bedrooms => a.bedrooms.cmp(&b.bedrooms),
            PropertySort::City => a.city.cmp(&b.city),
            PropertySort::ListedAt => a.listed_at.cmp(&b.listed_at),
        };
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }

    /// Filter and order a listing snapshot. The sort is stable, so rows
    /// comparing equal keep their upstream order.
    pub fn apply<'a>(&self, properties: &'a [Property]) -> Vec<&'a Property> {
        let mut matches: Vec<&Property> = properties
            .iter()
            .filter(|p| self.matches(p))
            .collect();
        matches.sort_by(|a, b| self.compare(a, b));
        matches
    }
}

/// One page out of a filtered listing.
pub fn page_of<'a>(matches: &[&'a Property], offset: u64, page_size: u8) -> Vec<&'a Property> {
    matches
        .iter()
        .skip(offset as usize)
        .take(page_size as usize)
        .copied()
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    fn prop(id: i64, city: &str, rent: i64, bedrooms: u8, status: PropertyStatus) -> Property {
        Property {
            id,
            address: format!("{} Main St", id),
            city: city.to_string(),
            rent_cents: rent,
            bedrooms,
            bathrooms: 1,
            status,
            manager_id: 1,
            listed_at: Utc.timestamp_opt(1_700_000_000 + id, 0).unwrap(),
            description: None,
        }
    }

    fn fixture() -> Vec<Property> {
        vec![
            prop(1, "Springfield", 120_000, 2, PropertyStatus::Vacant),
            prop(2, "Shelbyville", 95_000, 1, PropertyStatus::Occupied),
            prop(3, "Springfield", 210_000, 4, PropertyStatus::Vacant),
            prop(4, "Ogdenville", 150_000, 3, PropertyStatus::OffMarket),
        ]
    }

    #[test]
    fn city_filter_is_case_insensitive_substring() {
        let props = fixture();
        let q = PropertyQuery {
            city: Some("spring".to_string()),
            ..Default::default()
        };
        let found: Vec<i64> = q.apply(&props).iter().map(|p| p.id).collect();
        assert_eq!(found, vec![3, 1]);
    }

    #[test]
    fn rent_band_and_bedrooms_combine() {
        let props = fixture();
        let q = PropertyQuery {
            min_rent_cents: Some(100_000),
            max_rent_cents: Some(200_000),
            min_bedrooms: Some(2),
            ..Default::default()
        };
        let found: Vec<i64> = q.apply(&props).iter().map(|p| p.id).collect();
        assert_eq!(found, vec![4, 1]);
    }

    #[test]
    fn status_filter_narrows_to_exact_status() {
        let props = fixture();
        let q = PropertyQuery {
            status: Some(PropertyStatus::Vacant),
            ..Default::default()
        };
        assert_eq!(q.apply(&props).len(), 2);
    }

    #[test]
    fn default_sort_is_listing_date_descending() {
        let props = fixture();
        let found: Vec<i64> = PropertyQuery::default()
            .apply(&props)
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(found, vec![4, 3, 2, 1]);
    }

    #[test]
    fn rent_sort_ascending() {
        let props = fixture();
        let q = PropertyQuery {
            sort: PropertySort::Rent,
            direction: SortDirection::Ascending,
            ..Default::default()
        };
        let found: Vec<i64> = q.apply(&props).iter().map(|p| p.id).collect();
        assert_eq!(found, vec![2, 1, 4, 3]);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let props = fixture();
        let all = PropertyQuery::default().apply(&props);
        assert_eq!(page_of(&all, 0, 3).len(), 3);
        assert_eq!(page_of(&all, 3, 3).len(), 1);
        assert_eq!(page_of(&all, 6, 3).len(), 0);
    }

    #[test]
    fn rent_display_formats_cents() {
        let p = prop(1, "Springfield", 123_456, 2, PropertyStatus::Vacant);
        assert_eq!(p.rent_display(), "$1234.56");
    }
}
