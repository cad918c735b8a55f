//! Catalog and purchase handlers.

use actix_web::{HttpResponse, web};

use storefront_core::domain::{Invoice, InvoiceLine, Item, ItemPage, ItemSortKey, PriceRange};
use storefront_core::services::{NewItem, PurchaseRequest as Purchase};
use storefront_shared::ApiResponse;
use storefront_shared::dto::{
    CreateItemRequest, InvoiceResponse, ItemListQuery, ItemNameQuery, ItemQuantityResponse,
    ItemResponse, PriceRangeQuery, PurchaseLine, PurchaseRequest, SetQuantityRequest,
};

use crate::middleware::auth::BearerUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn item_response(item: Item) -> ItemResponse {
    ItemResponse {
        name: item.name,
        price: item.price,
        quantity: item.quantity,
        review: item.review,
    }
}

fn items_response(items: Vec<Item>) -> Vec<ItemResponse> {
    items.into_iter().map(item_response).collect()
}

fn invoice_response(invoice: Invoice) -> InvoiceResponse {
    InvoiceResponse {
        id: invoice.id,
        user_email: invoice.user_email,
        items: invoice
            .items
            .into_iter()
            .map(|l| PurchaseLine {
                name: l.name,
                price: l.price,
                quantity: l.quantity,
                total: l.total,
            })
            .collect(),
        total_amount: invoice.total_amount,
        status: invoice.status.as_str().to_string(),
        created_at: invoice.created_at,
    }
}

fn item_page(query: ItemListQuery) -> AppResult<ItemPage> {
    let sort_by = query
        .sort_by
        .parse::<ItemSortKey>()
        .map_err(AppError::BadInput)?;
    Ok(ItemPage {
        page: query.page,
        per_page: query.per_page,
        sort_by,
        ascending: query.ascending,
    })
}

/// GET /api/products/items
pub async fn list_items(
    state: web::Data<AppState>,
    user: BearerUser,
    query: web::Query<ItemListQuery>,
) -> AppResult<HttpResponse> {
    let page = item_page(query.into_inner())?;
    let items = state.catalog.list_items(&user.email, page).await?;
    Ok(HttpResponse::Ok().json(items_response(items)))
}

/// GET /api/products/items/by_name
pub async fn items_by_name(
    state: web::Data<AppState>,
    user: BearerUser,
    query: web::Query<ItemNameQuery>,
) -> AppResult<HttpResponse> {
    let items = state.catalog.items_by_name(&user.email, &query.name).await?;
    Ok(HttpResponse::Ok().json(items_response(items)))
}

/// GET /api/products/items/by_price
pub async fn items_by_price(
    state: web::Data<AppState>,
    user: BearerUser,
    query: web::Query<PriceRangeQuery>,
) -> AppResult<HttpResponse> {
    let range = PriceRange {
        lower: query.lower,
        upper: query.upper,
    };
    let items = state.catalog.items_by_price_range(&user.email, range).await?;
    Ok(HttpResponse::Ok().json(items_response(items)))
}

/// GET /api/products/items/quantity
pub async fn item_quantities(
    state: web::Data<AppState>,
    user: BearerUser,
    query: web::Query<ItemNameQuery>,
) -> AppResult<HttpResponse> {
    let quantities: Vec<ItemQuantityResponse> = state
        .catalog
        .item_quantities(&user.email, &query.name)
        .await?
        .into_iter()
        .map(|q| ItemQuantityResponse {
            name: q.name,
            quantity: q.quantity,
        })
        .collect();
    Ok(HttpResponse::Ok().json(quantities))
}

/// POST /api/products/items
pub async fn create_item(
    state: web::Data<AppState>,
    user: BearerUser,
    body: web::Json<CreateItemRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let item = state
        .catalog
        .create_item(
            &user.email,
            NewItem {
                name: req.name,
                price: req.price,
                quantity: req.quantity,
                review: req.review,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(item_response(item)))
}

/// POST /api/products/items/quantity
pub async fn set_item_quantity(
    state: web::Data<AppState>,
    user: BearerUser,
    body: web::Json<SetQuantityRequest>,
) -> AppResult<HttpResponse> {
    state
        .catalog
        .set_item_quantity(&user.email, &body.name, body.quantity)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("Quantity updated")))
}

/// POST /api/products/buy
pub async fn buy_items(
    state: web::Data<AppState>,
    user: BearerUser,
    body: web::Json<PurchaseRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let purchase = Purchase {
        user_email: req.user_email.unwrap_or_else(|| user.email.clone()),
        items: req
            .items
            .into_iter()
            .map(|l| InvoiceLine {
                name: l.name,
                price: l.price,
                quantity: l.quantity,
                total: l.total,
            })
            .collect(),
        total_amount: req.total_amount,
    };

    let invoice = state.catalog.buy_items(&user.email, purchase).await?;
    Ok(HttpResponse::Created().json(invoice_response(invoice)))
}

/// GET /api/products/invoices
pub async fn invoices(state: web::Data<AppState>, user: BearerUser) -> AppResult<HttpResponse> {
    let invoices: Vec<InvoiceResponse> = state
        .catalog
        .invoices_for(&user.email, &user.email)
        .await?
        .into_iter()
        .map(invoice_response)
        .collect();
    Ok(HttpResponse::Ok().json(invoices))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(sort_by: &str) -> ItemListQuery {
        ItemListQuery {
            page: 2,
            per_page: 10,
            sort_by: sort_by.to_string(),
            ascending: false,
        }
    }

    #[test]
    fn test_item_page_from_query() {
        let page = item_page(query("price")).unwrap();
        assert_eq!(page.sort_by, ItemSortKey::Price);
        assert_eq!(page.offset(), 20);
        assert!(!page.ascending);
    }

    #[test]
    fn test_unknown_sort_key_is_bad_input() {
        assert!(matches!(item_page(query("review")), Err(AppError::BadInput(_))));
    }
}
