use crate::persistence::{FishActiveModel, FishColumn, FishEntity, FishModel};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, Order, QueryOrder};

pub(crate) struct FishRepository;

impl FishRepository {
    pub(crate) async fn list_records<C>(db: &C, order: Order) -> Result<Vec<FishModel>, DbErr>
    where
        C: ConnectionTrait,
    {
        FishEntity::find()
            .order_by(FishColumn::Id, order)
            .all(db)
            .await
    }

    pub(crate) async fn find_model_by_id<C>(db: &C, id: i32) -> Result<Option<FishModel>, DbErr>
    where
        C: ConnectionTrait,
    {
        FishEntity::find_by_id(id).one(db).await
    }

    pub(crate) async fn insert<C>(db: &C, active_model: FishActiveModel) -> Result<FishModel, DbErr>
    where
        C: ConnectionTrait,
    {
        active_model.insert(db).await
    }

    pub(crate) async fn delete_by_id<C>(db: &C, id: i32) -> Result<u64, DbErr>
    where
        C: ConnectionTrait,
    {
        let result = FishEntity::delete_by_id(id).exec(db).await?;
        Ok(result.rows_affected)
    }
}
