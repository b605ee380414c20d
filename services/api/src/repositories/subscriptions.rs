//! Subscription repository: presence-toggle plus the subscriber-graph
//! aggregations

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::bson::{DateTime, Document, doc, from_document, oid::ObjectId};
use mongodb::{Collection, Database};

use common::pipeline::{PipelineBuilder, stage};

use crate::models::subscription::{SubscribedChannelEntry, SubscriberEntry, Subscription};

/// Subscription repository
#[derive(Clone)]
pub struct SubscriptionRepository {
    db: Database,
}

impl SubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self) -> Collection<Subscription> {
        self.db.collection::<Subscription>("subscriptions")
    }

    fn documents(&self) -> Collection<Document> {
        self.db.collection::<Document>("subscriptions")
    }

    /// Flip the subscription state for one (subscriber, channel) pair.
    ///
    /// Returns the resulting state — `true` when now subscribed.
    pub async fn toggle(&self, channel: ObjectId, subscriber: ObjectId) -> Result<bool> {
        let filter = doc! { "subscriber": subscriber, "channel": channel };

        match self.collection().find_one(filter.clone()).await? {
            Some(_) => {
                self.collection().delete_one(filter).await?;
                Ok(false)
            }
            None => {
                let subscription = Subscription {
                    id: None,
                    subscriber,
                    channel,
                    created_at: DateTime::now(),
                };

                self.collection().insert_one(&subscription).await?;
                Ok(true)
            }
        }
    }

    /// The subscribers of a channel, each annotated with whether the
    /// channel subscribes back and with their own subscriber count
    pub async fn subscribers_of(&self, channel: ObjectId) -> Result<Vec<SubscriberEntry>> {
        let pipeline = subscribers_pipeline(channel);

        let mut cursor = self.documents().aggregate(pipeline).await?;

        let mut subscribers = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            subscribers.push(from_document(doc)?);
        }

        Ok(subscribers)
    }

    /// The channels a user subscribes to, each with its most recent video
    pub async fn subscribed_channels(
        &self,
        subscriber: ObjectId,
    ) -> Result<Vec<SubscribedChannelEntry>> {
        let pipeline = subscribed_channels_pipeline(subscriber);

        let mut cursor = self.documents().aggregate(pipeline).await?;

        let mut channels = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            channels.push(from_document(doc)?);
        }

        Ok(channels)
    }
}

/// Subscriber listing: join each subscriber's user document, and inside it
/// join their own subscriber edges to derive the mutual-subscription flag
/// and their subscriber count
fn subscribers_pipeline(channel: ObjectId) -> Vec<Document> {
    PipelineBuilder::new()
        .stage(stage::match_stage(doc! { "channel": channel }))
        .stage(stage::lookup_pipeline(
            "users",
            "subscriber",
            "_id",
            "subscriber",
            PipelineBuilder::new()
                .stage(stage::lookup(
                    "subscriptions",
                    "_id",
                    "channel",
                    "subscriber_edges",
                ))
                .stage(stage::add_fields(doc! {
                    "subscribedToSubscriber": stage::in_array(channel, "subscriber_edges.subscriber"),
                    "subscribersCount": stage::size_of("subscriber_edges"),
                }))
                .stage(stage::project(doc! {
                    "username": 1,
                    "fullName": "$full_name",
                    "avatarUrl": "$avatar_url",
                    "subscribedToSubscriber": 1,
                    "subscribersCount": 1,
                }))
                .build(),
        ))
        .stage(stage::unwind("subscriber"))
        .stage(stage::project(doc! {
            "_id": "$subscriber._id",
            "username": "$subscriber.username",
            "fullName": "$subscriber.fullName",
            "avatarUrl": "$subscriber.avatarUrl",
            "subscribedToSubscriber": "$subscriber.subscribedToSubscriber",
            "subscribersCount": "$subscriber.subscribersCount",
        }))
        .build()
}

/// Subscribed-channel listing: join the channel's user document and pull
/// its newest video out of a nested video join
fn subscribed_channels_pipeline(subscriber: ObjectId) -> Vec<Document> {
    PipelineBuilder::new()
        .stage(stage::match_stage(doc! { "subscriber": subscriber }))
        .stage(stage::lookup_pipeline(
            "users",
            "channel",
            "_id",
            "channel",
            PipelineBuilder::new()
                .stage(stage::lookup(
                    "videos",
                    "_id",
                    "owner",
                    "channel_videos",
                ))
                .stage(stage::add_fields(doc! {
                    "latestVideo": stage::last_of("channel_videos"),
                }))
                // $last of an empty join is missing, so a channel without
                // videos carries no latestVideo field at all.
                .stage(stage::project(doc! {
                    "username": 1,
                    "fullName": "$full_name",
                    "avatarUrl": "$avatar_url",
                    "latestVideo": 1,
                }))
                .build(),
        ))
        .stage(stage::unwind("channel"))
        .stage(stage::project(doc! {
            "_id": "$channel._id",
            "username": "$channel.username",
            "fullName": "$channel.fullName",
            "avatarUrl": "$channel.avatarUrl",
            "latestVideo": "$channel.latestVideo",
        }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_listing_derives_mutual_flag_inside_the_join() {
        let channel = ObjectId::new();
        let pipeline = subscribers_pipeline(channel);

        assert_eq!(pipeline[0], doc! { "$match": { "channel": channel } });

        let lookup = pipeline[1].get_document("$lookup").unwrap();
        let nested = lookup.get_array("pipeline").unwrap();
        let add_fields = nested[1]
            .as_document()
            .unwrap()
            .get_document("$addFields")
            .unwrap();

        assert_eq!(
            add_fields.get_document("subscribedToSubscriber").unwrap(),
            &doc! {
                "$cond": {
                    "if": { "$in": [channel, "$subscriber_edges.subscriber"] },
                    "then": true,
                    "else": false,
                }
            }
        );

        assert_eq!(pipeline[2], doc! { "$unwind": "$subscriber" });
    }

    #[test]
    fn subscribed_channels_extract_the_latest_video() {
        let subscriber = ObjectId::new();
        let pipeline = subscribed_channels_pipeline(subscriber);

        let lookup = pipeline[1].get_document("$lookup").unwrap();
        let nested = lookup.get_array("pipeline").unwrap();
        let add_fields = nested[1]
            .as_document()
            .unwrap()
            .get_document("$addFields")
            .unwrap();

        assert_eq!(
            add_fields.get_document("latestVideo").unwrap(),
            &doc! { "$last": "$channel_videos" }
        );
    }
}
