use crate::binding::ParamSpec;
use crate::controller::{Controller, HandlerTable};
use crate::error::HttpError;
use crate::mapping::{ControllerMapping, RequestMapping};
use crate::repository::{Entity, MemoryRepository};
use crate::server::HttpResponse;
use http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Pet {
    pub fn new(name: impl Into<String>, species: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            species: species.into(),
            tags: Vec::new(),
        }
    }
}

impl Entity for Pet {
    fn id(&self) -> Option<u64> {
        self.id
    }

    fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}

/// Starting data for the demo store.
#[must_use]
pub fn seed_pets() -> Vec<Pet> {
    vec![
        Pet::new("Rex", "dog"),
        Pet::new("Tom", "cat"),
        Pet::new("Bubbles", "fish"),
        Pet::new("Ace", "dog"),
    ]
}

/// CRUD over `/pets`.
pub struct PetController {
    repo: MemoryRepository<Pet>,
}

impl PetController {
    pub fn new(repo: MemoryRepository<Pet>) -> Self {
        Self { repo }
    }

    fn validate(pet: &Pet) -> Result<(), HttpError> {
        if pet.name.trim().is_empty() {
            return Err(HttpError::bad_request("Pet name must not be empty"));
        }
        if pet.species.trim().is_empty() {
            return Err(HttpError::bad_request("Pet species must not be empty"));
        }
        Ok(())
    }
}

impl Controller for PetController {
    fn mapping() -> ControllerMapping {
        ControllerMapping::prefix("/pets")
    }

    fn handlers(table: &mut HandlerTable<Self>) {
        table
            .route(
                "list",
                RequestMapping::get("/"),
                vec![ParamSpec::pageable()],
                |me, args| async move {
                    let pageable = args.pageable().unwrap_or_default();
                    me.repo.find_page(&pageable).await
                },
            )
            // ahead of "/{id}", which also matches "/pets/search"
            .route(
                "search",
                RequestMapping::get("/search").order(50),
                vec![
                    ParamSpec::query::<String>("name"),
                    ParamSpec::optional_query::<String>("species"),
                ],
                |me, mut args| async move {
                    let name = args.require::<String>(0)?.to_lowercase();
                    let species = args.take::<String>(1);
                    me.repo
                        .find_where(move |p: &Pet| {
                            p.name.to_lowercase().contains(&name)
                                && species.as_deref().map_or(true, |s| p.species == s)
                        })
                        .await
                },
            )
            .route(
                "get",
                RequestMapping::get("/{id}"),
                vec![ParamSpec::path::<u64>("id")],
                |me, mut args| async move {
                    let id = args.require::<u64>(0)?;
                    match me.repo.find_one(id).await? {
                        Some(pet) => Ok(pet),
                        None => Err(HttpError::not_found(format!("Pet {id} not found")).into()),
                    }
                },
            )
            .route(
                "create",
                RequestMapping::post("/"),
                vec![ParamSpec::body::<Pet>()],
                |me, mut args| async move {
                    let pet = args.require::<Pet>(0)?;
                    Self::validate(&pet)?;
                    if let Some(id) = pet.id {
                        if me.repo.find_one(id).await?.is_some() {
                            return Err(HttpError::conflict(format!("Pet {id} already exists")).into());
                        }
                    }
                    let saved = me.repo.save(pet).await?;
                    Ok(HttpResponse::json(StatusCode::CREATED, &saved)?)
                },
            )
            .route(
                "update",
                RequestMapping::put("/{id}"),
                vec![ParamSpec::path::<u64>("id"), ParamSpec::body::<Pet>()],
                |me, mut args| async move {
                    let id = args.require::<u64>(0)?;
                    let pet = args.require::<Pet>(1)?;
                    Self::validate(&pet)?;
                    if me.repo.find_one(id).await?.is_none() {
                        return Err(HttpError::not_found(format!("Pet {id} not found")).into());
                    }
                    me.repo.save(pet.with_id(id)).await
                },
            )
            .route(
                "delete",
                RequestMapping::delete("/{id}"),
                vec![ParamSpec::path::<u64>("id")],
                |me, mut args| async move {
                    let id = args.require::<u64>(0)?;
                    if me.repo.delete(id).await? {
                        Ok(HttpResponse::no_content())
                    } else {
                        Err(HttpError::not_found(format!("Pet {id} not found")).into())
                    }
                },
            )
            .declare("validate");
    }
}
