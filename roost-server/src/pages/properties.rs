use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::{Form, Router};
use axum_extra::extract::cookie::PrivateCookieJar;
use axum_extra::routing::{RouterExt, TypedPath};
use itertools::Itertools;
use maud::{html, Markup};
use roost_core::error::{RoostError, RoostResult};
use roost_core::request_helper::HtmlResponse;
use roost_core::session::Authenticated;
use roost_core::state::{Flash, RoostRequestState, RoostState};
use roost_models::api::v1::PropertyParamsV1;
use roost_models::{
    page_of, Property, PropertyQuery, PropertySort, PropertyStatus, SortDirection, UserRole,
};

use crate::pages::common::flash::{clear_flash, put_flash};
use crate::pages::common::frontmatter::app;
use crate::pages::common::pagination::PaginationCtl;

const MANAGING_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Manager];

pub fn property_pages(r: Router<RoostState>) -> Router<RoostState> {
    r.typed_get(list_properties)
        .typed_post(create_property)
        .typed_get(new_property)
        .typed_get(show_property)
        .typed_post(update_property)
        .typed_get(edit_property)
        .typed_post(delete_property)
}

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/properties")]
pub struct PathProperties;

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/properties/new")]
pub struct PathNewProperty;

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/properties/:id")]
pub struct PathShowProperty {
    pub id: i64,
}

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/properties/:id/edit")]
pub struct PathEditProperty {
    pub id: i64,
}

#[derive(TypedPath, serde::Deserialize)]
#[typed_path("/properties/:id/delete")]
pub struct PathDeleteProperty {
    pub id: i64,
}

fn default_page() -> u64 {
    1
}

/// The listing filter as it appears in the URL. Unknown sort keys and
/// statuses read as "no preference" so a stale link cannot 500 the page.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default)]
pub struct PropertyListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rent: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rent: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default = "default_page", skip_serializing)]
    pub page: u64,
}

impl PropertyListParams {
    fn sort(&self) -> PropertySort {
        match self.sort.as_deref() {
            Some("rent") => PropertySort::Rent,
            Some("bedrooms") => PropertySort::Bedrooms,
            Some("city") => PropertySort::City,
            _ => PropertySort::ListedAt,
        }
    }

    fn direction(&self) -> SortDirection {
        match self.dir.as_deref() {
            Some("asc") => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }

    pub fn to_query(&self) -> PropertyQuery {
        PropertyQuery {
            city: self.city.clone().filter(|c| !c.trim().is_empty()),
            min_rent_cents: self.min_rent.map(|dollars| dollars * 100),
            max_rent_cents: self.max_rent.map(|dollars| dollars * 100),
            min_bedrooms: self.bedrooms,
            status: self.status.as_deref().and_then(|s| s.parse().ok()),
            sort: self.sort(),
            direction: self.direction(),
        }
    }

    /// The filter part of the query string, without the page number.
    pub fn base_query(&self) -> RoostResult<String> {
        serde_urlencoded::to_string(self).map_err(|e| RoostError::Other(e.to_string()))
    }

    fn sort_href(&self, key: &str) -> String {
        let mut params = self.clone();
        let flip = params.sort.as_deref() == Some(key) && params.dir.as_deref() != Some("asc");
        params.sort = Some(key.to_string());
        params.dir = Some(if flip { "asc" } else { "desc" }.to_string());
        match serde_urlencoded::to_string(&params) {
            Ok(query) => format!("?{}", query),
            Err(_) => "?".to_string(),
        }
    }
}

fn filter_form(params: &PropertyListParams, cities: &[&str]) -> Markup {
    html! {
        form.filters action=(PathProperties.to_uri().to_string()) method="GET" {
            input name="city" type="text" placeholder="City" list="known-cities" value=[params.city.as_deref()];
            datalist #known-cities {
                @for city in cities {
                    option value=(city) {}
                }
            }
            input name="min_rent" type="number" placeholder="Min rent" value=[params.min_rent];
            input name="max_rent" type="number" placeholder="Max rent" value=[params.max_rent];
            input name="bedrooms" type="number" placeholder="Bedrooms" value=[params.bedrooms];
            select name="status" {
                option value="" { "Any status" }
                @for status in [PropertyStatus::Vacant, PropertyStatus::Occupied, PropertyStatus::OffMarket] {
                    option value=(status.as_str()) selected[params.status.as_deref() == Some(status.as_str())] {
                        (status)
                    }
                }
            }
            button type="submit" { "Filter" }
        }
    }
}

#[instrument(skip_all)]
pub async fn list_properties(
    _: PathProperties,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
    Query(params): Query<PropertyListParams>,
) -> RoostResult<(PrivateCookieJar, HtmlResponse)> {
    let ctx = rstate.api_context()?;
    let properties = Property::all(state.client(), &ctx).await?;
    let matches = params.to_query().apply(&properties);

    let page_size = state.config().page_size;
    let pagination = PaginationCtl::new(
        params.page,
        page_size,
        matches.len() as u64,
        params.base_query()?,
        "property",
        "properties",
    );
    let offset = PaginationCtl::current_offset(params.page, page_size);
    let rows = page_of(&matches, offset, page_size);

    let cities: Vec<&str> = properties
        .iter()
        .map(|p| p.city.as_str())
        .unique()
        .sorted()
        .collect();
    let can_manage = rstate
        .role()
        .map(|r| r.manages_portfolio())
        .unwrap_or(false);

    let body = html! {
        h1 { "Properties" }
        (filter_form(&params, &cities))
        p.caption { (pagination.caption()) }
        table.listing {
            thead {
                tr {
                    th { a href=(params.sort_href("city")) { "City" } }
                    th { "Address" }
                    th { a href=(params.sort_href("rent")) { "Rent" } }
                    th { a href=(params.sort_href("bedrooms")) { "Bedrooms" } }
                    th { "Status" }
                }
            }
            tbody {
                @for property in &rows {
                    tr {
                        td { (property.city) }
                        td {
                            a href=(PathShowProperty { id: property.id }.to_uri().to_string()) {
                                (property.address)
                            }
                        }
                        td { (property.rent_display()) }
                        td { (property.bedrooms) }
                        td { (property.status) }
                    }
                }
            }
        }
        @if pagination.need_pagination() {
            (pagination.pagination())
        }
        @if can_manage {
            p { a href=(PathNewProperty.to_uri().to_string()) { "New property" } }
        }
    };
    let page = app(&rstate, Some("Properties".to_string()), body).await?;
    let jar = clear_flash(rstate.jar, state.config());
    Ok((jar, page.into()))
}

#[derive(serde::Deserialize, Debug)]
pub struct PropertyForm {
    pub address: String,
    pub city: String,
    /// whole dollars as typed into the form
    pub rent: i64,
    pub bedrooms: u8,
    pub bathrooms: u8,
    pub status: String,
    pub description: Option<String>,
}

impl PropertyForm {
    fn to_params(&self) -> RoostResult<PropertyParamsV1> {
        let status: PropertyStatus = self.status.parse().map_err(RoostError::Model)?;
        Ok(PropertyParamsV1::from_parts(
            self.address.clone(),
            self.city.clone(),
            self.rent * 100,
            self.bedrooms,
            self.bathrooms,
            status,
            self.description
                .clone()
                .filter(|d| !d.trim().is_empty()),
        ))
    }
}

fn property_form(action: String, existing: Option<&Property>) -> Markup {
    html! {
        form action=(action) method="POST" {
            .field {
                input name="address" type="text" required="true" placeholder="Address" value=[existing.map(|p| &p.address)];
            }
            .field {
                input name="city" type="text" required="true" placeholder="City" value=[existing.map(|p| &p.city)];
            }
            .field {
                input name="rent" type="number" required="true" placeholder="Monthly rent (dollars)" value=[existing.map(|p| p.rent_cents / 100)];
            }
            .field {
                input name="bedrooms" type="number" required="true" placeholder="Bedrooms" value=[existing.map(|p| p.bedrooms)];
            }
            .field {
                input name="bathrooms" type="number" required="true" placeholder="Bathrooms" value=[existing.map(|p| p.bathrooms)];
            }
            .field {
                select name="status" {
                    @for status in [PropertyStatus::Vacant, PropertyStatus::Occupied, PropertyStatus::OffMarket] {
                        option value=(status.as_str()) selected[existing.map(|p| p.status) == Some(status)] {
                            (status)
                        }
                    }
                }
            }
            .field {
                textarea name="description" placeholder="Description" {
                    @if let Some(description) = existing.and_then(|p| p.description.as_deref()) {
                        (description)
                    }
                }
            }
            .actions {
                button.button type="submit" { "Save" }
            }
        }
    }
}

#[instrument(skip_all)]
pub async fn new_property(
    _: PathNewProperty,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
) -> RoostResult<(PrivateCookieJar, HtmlResponse)> {
    rstate.require_role(MANAGING_ROLES)?;
    let body = html! {
        h1 { "New property" }
        (property_form(PathProperties.to_uri().to_string(), None))
    };
    let page = app(&rstate, Some("New property".to_string()), body).await?;
    let jar = clear_flash(rstate.jar, state.config());
    Ok((jar, page.into()))
}

#[instrument(skip_all)]
pub async fn create_property(
    _: PathProperties,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
    Form(form): Form<PropertyForm>,
) -> RoostResult<(PrivateCookieJar, Redirect)> {
    rstate.require_role(MANAGING_ROLES)?;
    let ctx = rstate.api_context()?;
    let property = Property::create(state.client(), &ctx, &form.to_params()?).await?;
    let jar = put_flash(rstate.jar, state.config(), Flash::alert("Property created"));
    Ok((
        jar,
        Redirect::to(&PathShowProperty { id: property.id }.to_uri().to_string()),
    ))
}

#[instrument(skip_all)]
pub async fn show_property(
    PathShowProperty { id }: PathShowProperty,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
) -> RoostResult<(PrivateCookieJar, HtmlResponse)> {
    let ctx = rstate.api_context()?;
    let property = Property::get(state.client(), &ctx, id)
        .await?
        .ok_or_else(|| RoostError::PageNotFound(format!("/properties/{}", id)))?;
    let can_manage = rstate
        .role()
        .map(|r| r.manages_portfolio())
        .unwrap_or(false);

    let body = html! {
        h1 { (property.address) }
        ul.details {
            li { "City: " (property.city) }
            li { "Rent: " (property.rent_display()) " per month" }
            li { "Bedrooms: " (property.bedrooms) ", bathrooms: " (property.bathrooms) }
            li { "Status: " (property.status) }
        }
        @if let Some(description) = &property.description {
            p.description { (description) }
        }
        @if can_manage {
            p {
                a href=(PathEditProperty { id }.to_uri().to_string()) { "Edit" }
            }
            form action=(PathDeleteProperty { id }.to_uri().to_string()) method="POST" {
                button.button type="submit" { "Delete property" }
            }
        }
    };
    let page = app(&rstate, Some(property.address.clone()), body).await?;
    let jar = clear_flash(rstate.jar, state.config());
    Ok((jar, page.into()))
}

#[instrument(skip_all)]
pub async fn edit_property(
    PathEditProperty { id }: PathEditProperty,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
) -> RoostResult<(PrivateCookieJar, HtmlResponse)> {
    rstate.require_role(MANAGING_ROLES)?;
    let ctx = rstate.api_context()?;
    let property = Property::get(state.client(), &ctx, id)
        .await?
        .ok_or_else(|| RoostError::PageNotFound(format!("/properties/{}", id)))?;
    let body = html! {
        h1 { "Edit " (property.address) }
        (property_form(PathShowProperty { id }.to_uri().to_string(), Some(&property)))
    };
    let page = app(&rstate, Some("Edit property".to_string()), body).await?;
    let jar = clear_flash(rstate.jar, state.config());
    Ok((jar, page.into()))
}

#[instrument(skip_all)]
pub async fn update_property(
    PathShowProperty { id }: PathShowProperty,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
    Form(form): Form<PropertyForm>,
) -> RoostResult<(PrivateCookieJar, Redirect)> {
    rstate.require_role(MANAGING_ROLES)?;
    let ctx = rstate.api_context()?;
    Property::update(state.client(), &ctx, id, &form.to_params()?).await?;
    let jar = put_flash(rstate.jar, state.config(), Flash::alert("Property updated"));
    Ok((
        jar,
        Redirect::to(&PathShowProperty { id }.to_uri().to_string()),
    ))
}

#[instrument(skip_all)]
pub async fn delete_property(
    PathDeleteProperty { id }: PathDeleteProperty,
    State(state): State<RoostState>,
    rstate: RoostRequestState<Authenticated>,
) -> RoostResult<(PrivateCookieJar, Redirect)> {
    rstate.require_role(MANAGING_ROLES)?;
    let ctx = rstate.api_context()?;
    Property::delete(state.client(), &ctx, id).await?;
    let jar = put_flash(rstate.jar, state.config(), Flash::alert("Property deleted"));
    Ok((jar, Redirect::to(&PathProperties.to_uri().to_string())))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unknown_sort_and_status_fall_back_to_defaults() {
        let params = PropertyListParams {
            sort: Some("colour".to_string()),
            status: Some("haunted".to_string()),
            ..Default::default()
        };
        let query = params.to_query();
        assert_eq!(query.sort, PropertySort::ListedAt);
        assert_eq!(query.status, None);
    }

    #[test]
    fn rent_filters_convert_dollars_to_cents() {
        let params = PropertyListParams {
            min_rent: Some(900),
            max_rent: Some(1500),
            ..Default::default()
        };
        let query = params.to_query();
        assert_eq!(query.min_rent_cents, Some(90_000));
        assert_eq!(query.max_rent_cents, Some(150_000));
    }

    #[test]
    fn base_query_omits_the_page_number() {
        let params = PropertyListParams {
            city: Some("springfield".to_string()),
            page: 7,
            ..Default::default()
        };
        assert_eq!(params.base_query().unwrap(), "city=springfield");
    }

    #[test]
    fn sort_href_toggles_direction_on_the_active_column() {
        let params = PropertyListParams {
            sort: Some("rent".to_string()),
            dir: Some("desc".to_string()),
            ..Default::default()
        };
        assert!(params.sort_href("rent").contains("dir=asc"));
        assert!(params.sort_href("city").contains("dir=desc"));
    }

    #[test]
    fn blank_city_filter_is_ignored() {
        let params = PropertyListParams {
            city: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.to_query().city, None);
    }
}
