//! Catalog rows and their append-only review children.

use std::collections::HashMap;

use rust_decimal::Decimal;
use shopd_schemas::{Product, ProductWithReviews, ReviewView};
use sqlx::PgPool;
use uuid::Uuid;

const PRODUCT_COLUMNS: &str =
    "product_id, name, price, description, image, stock, category, created_at";

const REVIEW_VIEW_QUERY: &str = r#"
    select r.review_id, r.product_id, r.user_id, u.email as user_email,
           r.rating, r.comment, r.created_at
    from reviews r
    join users u on u.user_id = r.user_id
"#;

/// Admin payload for creating or fully replacing a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub price: Decimal,
    pub description: Option<String>,
    pub image: Option<String>,
    pub stock: i32,
    pub category: Option<String>,
}

pub async fn list_products(pool: &PgPool) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "select {PRODUCT_COLUMNS} from products order by created_at"
    ))
    .fetch_all(pool)
    .await
}

/// Full public catalog: every product with its reviews (reviewer email
/// resolved) embedded. Two queries, grouped in memory.
pub async fn list_products_with_reviews(
    pool: &PgPool,
) -> Result<Vec<ProductWithReviews>, sqlx::Error> {
    let products = list_products(pool).await?;

    let reviews = sqlx::query_as::<_, ReviewView>(&format!(
        "{REVIEW_VIEW_QUERY} order by r.created_at"
    ))
    .fetch_all(pool)
    .await?;

    let mut by_product: HashMap<Uuid, Vec<ReviewView>> = HashMap::new();
    for review in reviews {
        by_product.entry(review.product_id).or_default().push(review);
    }

    Ok(products
        .into_iter()
        .map(|product| {
            let reviews = by_product.remove(&product.product_id).unwrap_or_default();
            ProductWithReviews { product, reviews }
        })
        .collect())
}

pub async fn get_product(pool: &PgPool, product_id: Uuid) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "select {PRODUCT_COLUMNS} from products where product_id = $1"
    ))
    .bind(product_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_product_with_reviews(
    pool: &PgPool,
    product_id: Uuid,
) -> Result<Option<ProductWithReviews>, sqlx::Error> {
    let Some(product) = get_product(pool, product_id).await? else {
        return Ok(None);
    };

    let reviews = sqlx::query_as::<_, ReviewView>(&format!(
        "{REVIEW_VIEW_QUERY} where r.product_id = $1 order by r.created_at"
    ))
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(ProductWithReviews { product, reviews }))
}

pub async fn insert_product(pool: &PgPool, input: &ProductInput) -> Result<Product, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        r#"
        insert into products (product_id, name, price, description, image, stock, category)
        values ($1, $2, $3, $4, $5, $6, $7)
        returning {PRODUCT_COLUMNS}
        "#,
    ))
    .bind(Uuid::new_v4())
    .bind(&input.name)
    .bind(input.price)
    .bind(&input.description)
    .bind(&input.image)
    .bind(input.stock)
    .bind(&input.category)
    .fetch_one(pool)
    .await
}

pub async fn update_product(
    pool: &PgPool,
    product_id: Uuid,
    input: &ProductInput,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        r#"
        update products
        set name = $2, price = $3, description = $4, image = $5, stock = $6, category = $7
        where product_id = $1
        returning {PRODUCT_COLUMNS}
        "#,
    ))
    .bind(product_id)
    .bind(&input.name)
    .bind(input.price)
    .bind(&input.description)
    .bind(&input.image)
    .bind(input.stock)
    .bind(&input.category)
    .fetch_optional(pool)
    .await
}

/// Delete a catalog row. Reviews cascade; order item snapshots keep their
/// frozen name/price and merely lose the soft product reference.
pub async fn delete_product(pool: &PgPool, product_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("delete from products where product_id = $1")
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Append a review. Rating bounds are validated at the HTTP boundary and
/// backstopped by the table CHECK constraint.
pub async fn insert_review(
    pool: &PgPool,
    product_id: Uuid,
    user_id: Uuid,
    rating: i32,
    comment: &str,
) -> Result<ReviewView, sqlx::Error> {
    sqlx::query_as::<_, ReviewView>(
        r#"
        with ins as (
            insert into reviews (review_id, product_id, user_id, rating, comment)
            values ($1, $2, $3, $4, $5)
            returning review_id, product_id, user_id, rating, comment, created_at
        )
        select ins.review_id, ins.product_id, ins.user_id, u.email as user_email,
               ins.rating, ins.comment, ins.created_at
        from ins
        join users u on u.user_id = ins.user_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(product_id)
    .bind(user_id)
    .bind(rating)
    .bind(comment)
    .fetch_one(pool)
    .await
}
