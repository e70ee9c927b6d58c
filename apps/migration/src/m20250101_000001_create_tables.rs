use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Handle,
    Avatar,
    FollowersCount,
    FolloweesCount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Follows {
    Table,
    FollowerId,
    FolloweeId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    AuthorId,
    Content,
    SpoilerOf,
    Nsfw,
    LikesCount,
    CommentsCount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PostLikes {
    Table,
    UserId,
    PostId,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    PostId,
    AuthorId,
    Content,
    LikesCount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CommentLikes {
    Table,
    UserId,
    CommentId,
}

#[derive(DeriveIden)]
enum PostSubscriptions {
    Table,
    UserId,
    PostId,
}

#[derive(DeriveIden)]
enum Timeline {
    Table,
    Id,
    UserId,
    PostId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    UserId,
    Actors,
    Type,
    PostId,
    Read,
    IssuedAt,
}

fn created_at<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

fn counter<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .big_integer()
        .not_null()
        .default(0)
        .to_owned()
}

fn cascade(
    name: &str,
    from: (impl IntoTableRef, impl IntoIden),
    to: (impl IntoTableRef, impl IntoIden),
) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(from.0, from.1)
        .to(to.0, to.1)
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Email).text().not_null().unique_key())
                    .col(ColumnDef::new(Users::Handle).text().not_null().unique_key())
                    .col(ColumnDef::new(Users::Avatar).text())
                    .col(counter(Users::FollowersCount))
                    .col(counter(Users::FolloweesCount))
                    .col(created_at(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Follows::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Follows::FollowerId).big_integer().not_null())
                    .col(ColumnDef::new(Follows::FolloweeId).big_integer().not_null())
                    .col(created_at(Follows::CreatedAt))
                    .primary_key(
                        Index::create()
                            .col(Follows::FollowerId)
                            .col(Follows::FolloweeId),
                    )
                    .foreign_key(&mut cascade(
                        "follows_follower_id_fkey",
                        (Follows::Table, Follows::FollowerId),
                        (Users::Table, Users::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "follows_followee_id_fkey",
                        (Follows::Table, Follows::FolloweeId),
                        (Users::Table, Users::Id),
                    ))
                    .check(Expr::col(Follows::FollowerId).ne(Expr::col(Follows::FolloweeId)))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Posts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Posts::AuthorId).big_integer().not_null())
                    .col(ColumnDef::new(Posts::Content).text().not_null())
                    .col(ColumnDef::new(Posts::SpoilerOf).text())
                    .col(ColumnDef::new(Posts::Nsfw).boolean().not_null().default(false))
                    .col(counter(Posts::LikesCount))
                    .col(counter(Posts::CommentsCount))
                    .col(created_at(Posts::CreatedAt))
                    .foreign_key(&mut cascade(
                        "posts_author_id_fkey",
                        (Posts::Table, Posts::AuthorId),
                        (Users::Table, Users::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PostLikes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PostLikes::UserId).big_integer().not_null())
                    .col(ColumnDef::new(PostLikes::PostId).big_integer().not_null())
                    .primary_key(Index::create().col(PostLikes::UserId).col(PostLikes::PostId))
                    .foreign_key(&mut cascade(
                        "post_likes_user_id_fkey",
                        (PostLikes::Table, PostLikes::UserId),
                        (Users::Table, Users::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "post_likes_post_id_fkey",
                        (PostLikes::Table, PostLikes::PostId),
                        (Posts::Table, Posts::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comments::PostId).big_integer().not_null())
                    .col(ColumnDef::new(Comments::AuthorId).big_integer().not_null())
                    .col(ColumnDef::new(Comments::Content).text().not_null())
                    .col(counter(Comments::LikesCount))
                    .col(created_at(Comments::CreatedAt))
                    .foreign_key(&mut cascade(
                        "comments_post_id_fkey",
                        (Comments::Table, Comments::PostId),
                        (Posts::Table, Posts::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "comments_author_id_fkey",
                        (Comments::Table, Comments::AuthorId),
                        (Users::Table, Users::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CommentLikes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CommentLikes::UserId).big_integer().not_null())
                    .col(ColumnDef::new(CommentLikes::CommentId).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(CommentLikes::UserId)
                            .col(CommentLikes::CommentId),
                    )
                    .foreign_key(&mut cascade(
                        "comment_likes_user_id_fkey",
                        (CommentLikes::Table, CommentLikes::UserId),
                        (Users::Table, Users::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "comment_likes_comment_id_fkey",
                        (CommentLikes::Table, CommentLikes::CommentId),
                        (Comments::Table, Comments::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PostSubscriptions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PostSubscriptions::UserId).big_integer().not_null())
                    .col(ColumnDef::new(PostSubscriptions::PostId).big_integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(PostSubscriptions::UserId)
                            .col(PostSubscriptions::PostId),
                    )
                    .foreign_key(&mut cascade(
                        "post_subscriptions_user_id_fkey",
                        (PostSubscriptions::Table, PostSubscriptions::UserId),
                        (Users::Table, Users::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "post_subscriptions_post_id_fkey",
                        (PostSubscriptions::Table, PostSubscriptions::PostId),
                        (Posts::Table, Posts::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Timeline::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Timeline::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Timeline::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Timeline::PostId).big_integer().not_null())
                    .col(created_at(Timeline::CreatedAt))
                    .foreign_key(&mut cascade(
                        "timeline_user_id_fkey",
                        (Timeline::Table, Timeline::UserId),
                        (Users::Table, Users::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "timeline_post_id_fkey",
                        (Timeline::Table, Timeline::PostId),
                        (Posts::Table, Posts::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("timeline_user_id_post_id_key")
                    .table(Timeline::Table)
                    .col(Timeline::UserId)
                    .col(Timeline::PostId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Notifications::Actors)
                            .array(ColumnType::Text)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notifications::Type).text().not_null())
                    .col(ColumnDef::new(Notifications::PostId).big_integer())
                    .col(
                        ColumnDef::new(Notifications::Read)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(created_at(Notifications::IssuedAt))
                    .foreign_key(&mut cascade(
                        "notifications_user_id_fkey",
                        (Notifications::Table, Notifications::UserId),
                        (Users::Table, Users::Id),
                    ))
                    .foreign_key(&mut cascade(
                        "notifications_post_id_fkey",
                        (Notifications::Table, Notifications::PostId),
                        (Posts::Table, Posts::Id),
                    ))
                    .to_owned(),
            )
            .await?;

        // At most one unread notification per (user, type, subject). The expression
        // index is what the notification upserts conflict on.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS notifications_unread_key \
                 ON notifications (user_id, type, COALESCE(post_id, 0)) WHERE read = false",
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("notifications_user_id_id_idx")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .col(Notifications::Id)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Notifications::Table.into_iden(),
            Timeline::Table.into_iden(),
            PostSubscriptions::Table.into_iden(),
            CommentLikes::Table.into_iden(),
            Comments::Table.into_iden(),
            PostLikes::Table.into_iden(),
            Posts::Table.into_iden(),
            Follows::Table.into_iden(),
            Users::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}
