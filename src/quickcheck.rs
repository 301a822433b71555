use compare::Compare;
use quickcheck::{Arbitrary, Gen};
use std::default::Default;
use super::Map;

impl<K, V, C> Arbitrary for Map<K, V, C>
    where K: Arbitrary, V: Arbitrary, C: 'static + Clone + Compare<K> + Default {

    fn arbitrary(gen: &mut Gen) -> Self {
        let mut map = Map::default();
        for (key, value) in Vec::<(K, V)>::arbitrary(gen) { map.insert(key, value); }
        map
    }

    fn shrink(&self) -> Box<dyn Iterator<Item=Self>> {
        let mut vec = Vec::with_capacity(self.len());
        self.for_each(|key, value| vec.push((key.clone(), value.clone())));

        Box::new(vec.shrink().map(|vec| {
            let mut map = Map::default();
            for (key, value) in vec { map.insert(key, value); }
            map
        }))
    }
}
