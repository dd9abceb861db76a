//! The scalar capability bundle every record feature must provide.
//!
//! Classifiers sort, bucket and numerically interpret features without knowing
//! their concrete type, so a [`Feature`] is cloneable, totally ordered,
//! comparable for equality and convertible to and from primitive
//! representations. Floats participate through [`OrderedFloat`], which supplies
//! the total order `f64` lacks.

use ordered_float::OrderedFloat;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Debug;

/// A single comparable, convertible scalar value inside a record.
///
/// `to_text` and `from_text` form a lossless pair: for every feature `f`,
/// `F::from_text(&f.to_text()) == Some(f)`. Delimited writers and readers rely
/// on this to move features through text cells.
pub trait Feature: Clone + Ord + Eq + Debug + Serialize + DeserializeOwned {
    /// Numeric view of the feature, if it has one.
    fn to_f64(&self) -> Option<f64>;

    /// Integral view of the feature, if it has one without loss.
    fn to_i64(&self) -> Option<i64>;

    fn to_text(&self) -> String;

    fn from_text(text: &str) -> Option<Self>;

    /// Structured (JSON) form of the feature inside a record. Defaults to the
    /// type's serde representation; override when that representation cannot
    /// hold every value.
    fn serialize_value<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.serialize(serializer)
    }

    /// Inverse of [`serialize_value`](Feature::serialize_value).
    fn deserialize_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::deserialize(deserializer)
    }
}

impl Feature for String {
    fn to_f64(&self) -> Option<f64> {
        self.trim().parse().ok()
    }

    fn to_i64(&self) -> Option<i64> {
        self.trim().parse().ok()
    }

    fn to_text(&self) -> String {
        self.clone()
    }

    fn from_text(text: &str) -> Option<Self> {
        Some(text.to_string())
    }
}

impl Feature for i64 {
    fn to_f64(&self) -> Option<f64> {
        Some(*self as f64)
    }

    fn to_i64(&self) -> Option<i64> {
        Some(*self)
    }

    fn to_text(&self) -> String {
        self.to_string()
    }

    fn from_text(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl Feature for u64 {
    fn to_f64(&self) -> Option<f64> {
        Some(*self as f64)
    }

    fn to_i64(&self) -> Option<i64> {
        i64::try_from(*self).ok()
    }

    fn to_text(&self) -> String {
        self.to_string()
    }

    fn from_text(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

impl Feature for bool {
    fn to_f64(&self) -> Option<f64> {
        Some(if *self { 1.0 } else { 0.0 })
    }

    fn to_i64(&self) -> Option<i64> {
        Some(i64::from(*self))
    }

    fn to_text(&self) -> String {
        self.to_string()
    }

    fn from_text(text: &str) -> Option<Self> {
        match text.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}

impl Feature for OrderedFloat<f64> {
    fn to_f64(&self) -> Option<f64> {
        Some(self.0)
    }

    fn to_i64(&self) -> Option<i64> {
        let v = self.0;
        // only whole numbers inside the i64 range convert without loss
        if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
            Some(v as i64)
        } else {
            None
        }
    }

    fn to_text(&self) -> String {
        // Display for f64 prints the shortest representation that parses back exactly
        self.0.to_string()
    }

    fn from_text(text: &str) -> Option<Self> {
        text.trim().parse::<f64>().ok().map(OrderedFloat)
    }

    /// JSON has no literal for infinities or NaN; those are written as their
    /// text form (`"inf"`, `"-inf"`, `"NaN"`).
    fn serialize_value<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else {
            serializer.serialize_str(&self.to_text())
        }
    }

    fn deserialize_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(OrderedFloat(v)),
            Repr::Text(t) => Self::from_text(&t)
                .ok_or_else(|| D::Error::custom(format!("invalid float feature {t:?}"))),
        }
    }
}

/// Serde adapter for a feature list, routed through
/// [`Feature::serialize_value`] and [`Feature::deserialize_value`].
///
/// Use with `#[serde(with = "stagekit::feature::values")]` on a `Vec<F>` field.
pub mod values {
    use super::Feature;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    struct AsValue<'a, F>(&'a F);

    impl<F: Feature> Serialize for AsValue<'_, F> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            self.0.serialize_value(serializer)
        }
    }

    struct FromValue<F>(F);

    impl<'de, F: Feature> Deserialize<'de> for FromValue<F> {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            F::deserialize_value(deserializer).map(FromValue)
        }
    }

    pub fn serialize<F: Feature, S: Serializer>(features: &[F], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(features.iter().map(AsValue))
    }

    pub fn deserialize<'de, F: Feature, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<F>, D::Error> {
        let values = Vec::<FromValue<F>>::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_text_roundtrip<F: Feature>(f: F) {
        assert_eq!(F::from_text(&f.to_text()), Some(f));
    }

    #[test]
    fn test_text_roundtrip() {
        assert_text_roundtrip("hello world".to_string());
        assert_text_roundtrip(String::new());
        assert_text_roundtrip(-42i64);
        assert_text_roundtrip(u64::MAX);
        assert_text_roundtrip(true);
        assert_text_roundtrip(OrderedFloat(0.1f64));
        assert_text_roundtrip(OrderedFloat(-1.0e-300f64));
        assert_text_roundtrip(OrderedFloat(f64::INFINITY));
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!("3.5".to_string().to_f64(), Some(3.5));
        assert_eq!("abc".to_string().to_f64(), None);
        assert_eq!(7u64.to_i64(), Some(7));
        assert_eq!(u64::MAX.to_i64(), None);
        assert_eq!(true.to_f64(), Some(1.0));
        assert_eq!(OrderedFloat(4.0f64).to_i64(), Some(4));
        assert_eq!(OrderedFloat(4.5f64).to_i64(), None);
        assert_eq!(OrderedFloat(f64::NAN).to_i64(), None);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(bound(serialize = "F: Feature", deserialize = "F: Feature"))]
    struct Holder<F> {
        #[serde(with = "values")]
        features: Vec<F>,
    }

    #[test]
    fn test_non_finite_floats_in_json() -> anyhow::Result<()> {
        let h = Holder {
            features: vec![
                OrderedFloat(1.5f64),
                OrderedFloat(f64::INFINITY),
                OrderedFloat(f64::NEG_INFINITY),
                OrderedFloat(f64::NAN),
            ],
        };
        let json = serde_json::to_string(&h)?;
        assert_eq!(json, r#"{"features":[1.5,"inf","-inf","NaN"]}"#);
        let back: Holder<OrderedFloat<f64>> = serde_json::from_str(&json)?;
        assert_eq!(back, h);

        let ints: Holder<OrderedFloat<f64>> = serde_json::from_str(r#"{"features":[2]}"#)?;
        assert_eq!(ints.features, vec![OrderedFloat(2.0)]);
        assert!(serde_json::from_str::<Holder<OrderedFloat<f64>>>(r#"{"features":["x"]}"#).is_err());
        Ok(())
    }

    #[test]
    fn test_float_total_order() {
        let mut v = vec![
            OrderedFloat(2.0f64),
            OrderedFloat(f64::NAN),
            OrderedFloat(-1.0),
            OrderedFloat(0.5),
        ];
        v.sort();
        assert_eq!(v[0], OrderedFloat(-1.0));
        assert_eq!(v[2], OrderedFloat(2.0));
        assert!(v[3].0.is_nan());
    }
}
