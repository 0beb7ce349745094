//! Product catalogue operations.

use std::collections::HashMap;

use chrono::Utc;
use doc_store::DocumentStore;
use serde::Serialize;
use serde_json::json;

use crate::error::DomainError;
use crate::repository::Repository;
use crate::user::{User, UserSummary};
use crate::value_objects::{ProductId, UserId};

use super::{Category, Product, ProductDraft};

/// A product with its owner's name and contact.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListing {
    #[serde(flatten)]
    pub product: Product,
    pub owner_details: Option<UserSummary>,
}

/// Service for the product catalogue.
pub struct ProductService<S: DocumentStore> {
    products: Repository<S, Product>,
    users: Repository<S, User>,
}

impl<S: DocumentStore + Clone> ProductService<S> {
    /// Creates a new product service.
    pub fn new(store: S) -> Self {
        Self {
            products: Repository::new(store.clone()),
            users: Repository::new(store),
        }
    }
}

impl<S: DocumentStore> ProductService<S> {
    /// The closed category list.
    pub fn categories(&self) -> &'static [Category] {
        &Category::ALL
    }

    /// Lists products newest first, optionally limited to one category.
    ///
    /// `None` and `"all"` both mean every category.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<ProductListing>, DomainError> {
        let mut query = self.products.query().newest_first();
        if let Some(category) = category
            && !category.is_empty()
            && category != "all"
        {
            query = query.filter(json!({ "category": category }));
        }

        let products = self.products.find(query).await?;

        let mut owners: HashMap<UserId, Option<UserSummary>> = HashMap::new();
        let mut listings = Vec::with_capacity(products.len());
        for product in products {
            let owner_details = match owners.get(&product.owner) {
                Some(summary) => summary.clone(),
                None => {
                    let summary = self.users.get(product.owner).await?.map(|u| u.summary());
                    owners.insert(product.owner, summary.clone());
                    summary
                }
            };
            listings.push(ProductListing {
                product,
                owner_details,
            });
        }

        Ok(listings)
    }

    /// Loads one product.
    pub async fn get(&self, id: ProductId) -> Result<Product, DomainError> {
        self.products.require(id).await
    }

    /// Lists the products a merchant owns, newest first.
    pub async fn list_owned(&self, owner: UserId) -> Result<Vec<Product>, DomainError> {
        let query = self
            .products
            .query()
            .filter(Product::owner_filter(owner))
            .newest_first();
        self.products.find(query).await
    }

    /// Creates a listing owned by `owner`.
    #[tracing::instrument(skip(self, draft))]
    pub async fn create(&self, owner: UserId, draft: ProductDraft) -> Result<Product, DomainError> {
        let valid = draft.validate()?;
        let now = Utc::now();

        let product = Product {
            id: ProductId::new(),
            name: valid.name,
            description: valid.description,
            price: valid.price,
            quantity: valid.quantity,
            images: valid.images.unwrap_or_default(),
            brand: valid.brand,
            category: valid.category,
            owner,
            created_at: now,
            updated_at: now,
        };

        self.products.insert(&product).await?;
        tracing::info!(product_id = %product.id, "Product created");

        Ok(product)
    }

    /// Replaces a listing's fields. Images are kept unless new ones are given.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update(
        &self,
        owner: UserId,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<Product, DomainError> {
        let valid = draft.validate()?;
        let mut product = self.products.require(id).await?;

        if !product.is_owned_by(owner) {
            return Err(DomainError::Forbidden(
                "You can only update your own products".to_string(),
            ));
        }

        product.name = valid.name;
        product.description = valid.description;
        product.price = valid.price;
        product.quantity = valid.quantity;
        product.brand = valid.brand;
        product.category = valid.category;
        if let Some(images) = valid.images {
            product.images = images;
        }
        product.updated_at = Utc::now();

        self.products.save(&product).await?;
        Ok(product)
    }

    /// Removes a listing.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, owner: UserId, id: ProductId) -> Result<(), DomainError> {
        let product = self.products.require(id).await?;

        if !product.is_owned_by(owner) {
            return Err(DomainError::Forbidden(
                "You can only delete your own products".to_string(),
            ));
        }

        self.products.delete(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use doc_store::InMemoryDocumentStore;

    use super::*;

    fn draft(name: &str, category: Option<&str>) -> ProductDraft {
        ProductDraft {
            name: Some(name.to_string()),
            description: Some("desc".to_string()),
            price: Some(1500),
            quantity: Some(4),
            category: category.map(str::to_string),
            images: Some(vec!["/uploads/products/a.png".to_string()]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn list_filters_by_category_newest_first() {
        let service = ProductService::new(InMemoryDocumentStore::new());
        let owner = UserId::new();

        service.create(owner, draft("Book", Some("Books"))).await.unwrap();
        service.create(owner, draft("Phone", Some("Electronics"))).await.unwrap();
        service.create(owner, draft("Novel", Some("Books"))).await.unwrap();

        let all = service.list(Some("all")).await.unwrap();
        let books = service.list(Some("Books")).await.unwrap();

        assert_eq!(all.len(), 3);
        let names: Vec<_> = books.iter().map(|l| l.product.name.as_str()).collect();
        assert_eq!(names, vec!["Novel", "Book"]);
        assert!(books[0].owner_details.is_none());
    }

    #[tokio::test]
    async fn update_keeps_images_unless_replaced() {
        let service = ProductService::new(InMemoryDocumentStore::new());
        let owner = UserId::new();
        let product = service.create(owner, draft("Lamp", None)).await.unwrap();

        let mut change = draft("Lamp v2", None);
        change.images = None;
        let updated = service.update(owner, product.id, change).await.unwrap();

        assert_eq!(updated.name, "Lamp v2");
        assert_eq!(updated.images, product.images);
    }

    #[tokio::test]
    async fn only_the_owner_may_update_or_delete() {
        let service = ProductService::new(InMemoryDocumentStore::new());
        let owner = UserId::new();
        let stranger = UserId::new();
        let product = service.create(owner, draft("Lamp", None)).await.unwrap();

        assert!(matches!(
            service.update(stranger, product.id, draft("Mine", None)).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            service.delete(stranger, product.id).await,
            Err(DomainError::Forbidden(_))
        ));

        service.delete(owner, product.id).await.unwrap();
        assert!(matches!(
            service.get(product.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_owned_only_returns_own_products() {
        let service = ProductService::new(InMemoryDocumentStore::new());
        let owner = UserId::new();
        service.create(owner, draft("Mine", None)).await.unwrap();
        service.create(UserId::new(), draft("Theirs", None)).await.unwrap();

        let owned = service.list_owned(owner).await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].name, "Mine");
    }
}
