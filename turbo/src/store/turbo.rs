use super::{statements::TURBOS, Context, Error, Executor, Operation, Store};
use crate::proto::{CreateTurboRequest, TurboResponse, UpdateTurboRequest};
use std::fmt;
use uuid::Uuid;

/// A single live row in the turbos table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turbo {
    /// immutable primary key
    pub id: Uuid,
    /// mutable display name
    pub name: String,
}

impl fmt::Display for Turbo {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{id: {}, name: {:?}}}", self.id, self.name)
    }
}

/// Wire messages that carry the mutable fields of a turbo
pub trait ProtoTurbo {
    /// The requested turbo name
    fn name(&self) -> &str;
}

impl ProtoTurbo for CreateTurboRequest {
    fn name(&self) -> &str {
        &self.name
    }
}

impl ProtoTurbo for UpdateTurboRequest {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Parse a turbo ID from its string representation
pub fn parse_id(id: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(id).map_err(|source| Error::MalformedIdentifier {
        id: id.to_string(),
        source,
    })
}

impl Turbo {
    /// Build a turbo from a wire-level ID and message
    pub fn from_proto<P>(id: &str, proto: &P) -> Result<Self, Error>
    where
        P: ProtoTurbo + ?Sized,
    {
        Ok(Self {
            id: parse_id(id)?,
            name: proto.name().to_string(),
        })
    }

    /// Convert this turbo into its wire-level response
    pub fn to_proto(&self) -> TurboResponse {
        TurboResponse {
            turbo_id: self.id.to_string(),
            name: self.name.clone(),
        }
    }
}

impl From<Turbo> for TurboResponse {
    fn from(turbo: Turbo) -> Self {
        Self {
            turbo_id: turbo.id.to_string(),
            name: turbo.name,
        }
    }
}

/// Fetch a single live turbo through any executor
pub async fn get<E>(executor: &E, id: Uuid) -> Result<Turbo, Error>
where
    E: Executor + ?Sized,
{
    let statement = executor.prepare(TURBOS.get).await?;

    let row = executor
        .query_opt(&statement, &[&id])
        .await?
        .ok_or(Error::NotFound)?;

    Ok(Turbo {
        id: row.try_get("turbo_id")?,
        name: row.try_get("name")?,
    })
}

/// Insert a new turbo through any executor
pub async fn create<E>(executor: &E, turbo: &Turbo) -> Result<(), Error>
where
    E: Executor + ?Sized,
{
    let statement = executor.prepare(TURBOS.create).await?;
    let row_count = executor
        .execute(&statement, &[&turbo.id, &turbo.name])
        .await?;

    if row_count == 0 {
        return Err(Error::NotCreated);
    }

    Ok(())
}

/// Rename a single live turbo through any executor
pub async fn update<E>(executor: &E, turbo: &Turbo) -> Result<(), Error>
where
    E: Executor + ?Sized,
{
    let statement = executor.prepare(TURBOS.update).await?;
    let row_count = executor
        .execute(&statement, &[&turbo.name, &turbo.id])
        .await?;

    if row_count == 0 {
        return Err(Error::NoRowsAffected);
    }

    Ok(())
}

/// Soft-delete a single live turbo through any executor
pub async fn delete<E>(executor: &E, id: Uuid) -> Result<(), Error>
where
    E: Executor + ?Sized,
{
    let statement = executor.prepare(TURBOS.delete).await?;
    let row_count = executor.execute(&statement, &[&id]).await?;

    if row_count == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Turbo operations against the store's pool or a transaction from a Context
impl Store {
    /// Fetch a single live turbo using a pooled connection
    #[tracing::instrument(skip(self, context), err)]
    pub async fn get(&self, context: &Context<'_>, id: Uuid) -> Result<Turbo, Error> {
        context
            .run(async {
                let client = self.connection().await?;
                get(&client, id).await
            })
            .await
            .unwrap_or(Err(Error::Timeout))
            .map_err(|error| error.wrap(Operation::Get, id))
    }

    /// Fetch a single live turbo inside the Context's transaction
    #[tracing::instrument(skip(self, context), err)]
    pub async fn get_tx(&self, context: &Context<'_>, id: Uuid) -> Result<Turbo, Error> {
        let transaction = context.transaction()?;

        context
            .run(get(transaction, id))
            .await
            .unwrap_or(Err(Error::Timeout))
            .map_err(|error| error.wrap(Operation::Get, id))
    }

    /// Insert a new turbo using a pooled connection
    #[tracing::instrument(skip(self, context), err)]
    pub async fn create(&self, context: &Context<'_>, turbo: &Turbo) -> Result<(), Error> {
        context
            .run(async {
                let client = self.connection().await?;
                create(&client, turbo).await
            })
            .await
            .unwrap_or(Err(Error::Timeout))
            .map_err(|error| error.wrap(Operation::Create, turbo))
    }

    /// Insert a new turbo inside the Context's transaction
    #[tracing::instrument(skip(self, context), err)]
    pub async fn create_tx(&self, context: &Context<'_>, turbo: &Turbo) -> Result<(), Error> {
        let transaction = context.transaction()?;

        context
            .run(create(transaction, turbo))
            .await
            .unwrap_or(Err(Error::Timeout))
            .map_err(|error| error.wrap(Operation::Create, turbo))
    }

    /// Rename a single live turbo using a pooled connection
    #[tracing::instrument(skip(self, context), err)]
    pub async fn update(&self, context: &Context<'_>, turbo: &Turbo) -> Result<(), Error> {
        context
            .run(async {
                let client = self.connection().await?;
                update(&client, turbo).await
            })
            .await
            .unwrap_or(Err(Error::Timeout))
            .map_err(|error| error.wrap(Operation::Update, turbo))
    }

    /// Rename a single live turbo inside the Context's transaction
    #[tracing::instrument(skip(self, context), err)]
    pub async fn update_tx(&self, context: &Context<'_>, turbo: &Turbo) -> Result<(), Error> {
        let transaction = context.transaction()?;

        context
            .run(update(transaction, turbo))
            .await
            .unwrap_or(Err(Error::Timeout))
            .map_err(|error| error.wrap(Operation::Update, turbo))
    }

    /// Soft-delete a single live turbo using a pooled connection
    #[tracing::instrument(skip(self, context), err)]
    pub async fn delete(&self, context: &Context<'_>, id: Uuid) -> Result<(), Error> {
        context
            .run(async {
                let client = self.connection().await?;
                delete(&client, id).await
            })
            .await
            .unwrap_or(Err(Error::Timeout))
            .map_err(|error| error.wrap(Operation::Delete, id))
    }

    /// Soft-delete a single live turbo inside the Context's transaction
    #[tracing::instrument(skip(self, context), err)]
    pub async fn delete_tx(&self, context: &Context<'_>, id: Uuid) -> Result<(), Error> {
        let transaction = context.transaction()?;

        context
            .run(delete(transaction, id))
            .await
            .unwrap_or(Err(Error::Timeout))
            .map_err(|error| error.wrap(Operation::Delete, id))
    }
}

#[cfg(test)]
mod test {
    use super::{Turbo, TurboResponse};
    use crate::{
        proto::{CreateTurboRequest, UpdateTurboRequest},
        store::{Context, Kind, Store},
    };
    use uuid::Uuid;

    const TURBO_ID: &str = "72bc87f3-4a9f-4d05-93fe-844d3cd94c65";

    #[test]
    fn builds_turbos_from_requests() {
        let request = CreateTurboRequest {
            turbo_id: String::new(),
            name: "Foobar".into(),
        };

        let turbo = Turbo::from_proto(TURBO_ID, &request).expect("Valid ID was rejected");

        assert_eq!(turbo.id, Uuid::parse_str(TURBO_ID).unwrap());
        assert_eq!(turbo.name, "Foobar");
    }

    #[test]
    fn rejects_malformed_ids() {
        let request = UpdateTurboRequest {
            turbo_id: "72bc87f3".into(),
            name: "Foobar".into(),
        };

        let error = Turbo::from_proto(&request.turbo_id, &request)
            .expect_err("Malformed ID was accepted");

        assert_eq!(error.kind(), Kind::MalformedIdentifier);
        assert!(error.to_string().contains("72bc87f3"));
    }

    #[test]
    fn converts_turbos_to_responses() {
        let turbo = Turbo {
            id: Uuid::parse_str(TURBO_ID).unwrap(),
            name: "foobar".into(),
        };

        let response = turbo.to_proto();

        assert_eq!(response.turbo_id, TURBO_ID);
        assert_eq!(response.name, "foobar");
        assert_eq!(TurboResponse::from(turbo), response);
    }

    #[test]
    fn renders_canonical_lowercase_ids() {
        let turbo = Turbo {
            id: Uuid::parse_str(&TURBO_ID.to_uppercase()).unwrap(),
            name: "foobar".into(),
        };

        assert_eq!(turbo.to_proto().turbo_id, TURBO_ID);
    }

    #[tokio::test]
    async fn transactional_variants_require_a_transaction() {
        let store = Store::lazy();
        let context = Context::default();
        let turbo = Turbo {
            id: Uuid::parse_str(TURBO_ID).unwrap(),
            name: "Foobar".into(),
        };

        let errors = [
            store.get_tx(&context, turbo.id).await.unwrap_err(),
            store.create_tx(&context, &turbo).await.unwrap_err(),
            store.update_tx(&context, &turbo).await.unwrap_err(),
            store.delete_tx(&context, turbo.id).await.unwrap_err(),
        ];

        for error in errors {
            assert_eq!(error.kind(), Kind::NoTransactionInContext);
        }
    }
}
